//! rANS Nx16 codec.
//!
//! Four interleaved 32-bit rANS states with 16-bit renormalization. The
//! leading flag byte selects the model order and optional transforms: bit
//! packing, run-length encoding, byte striping, and a store-uncompressed
//! escape.

mod decode;
mod encode;

pub use self::{decode::decode, encode::encode};

bitflags::bitflags! {
    /// rANS Nx16 flags, stored as the first byte of the stream.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Flags: u8 {
        /// Use an order-1 model instead of order-0.
        const ORDER = 0x01;
        /// Interleave four byte planes, each compressed independently.
        const STRIPE = 0x08;
        /// Do not store the uncompressed size.
        const NO_SIZE = 0x10;
        /// Store the payload uncompressed.
        const CAT = 0x20;
        /// Run-length encode the payload before entropy coding.
        const RLE = 0x40;
        /// Bit-pack the payload before entropy coding.
        const PACK = 0x80;
    }
}

const LOWER_BOUND: u32 = 1 << 15;
const TOTAL_FREQ_SHIFT: u32 = 12;
const TOTAL_FREQ_SHIFT_ORDER_1: u32 = 11;
const STATE_COUNT: usize = 4;
