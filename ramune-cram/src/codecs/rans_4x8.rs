//! rANS static 4x8 codec.
//!
//! Four interleaved 32-bit rANS states with byte-wise renormalization and
//! 12-bit frequencies. Order-0 models symbols independently; order-1 models
//! them on the previous symbol, with the input split into four quarters so
//! each state keeps its own context.

mod decode;
mod encode;

pub use self::{decode::decode, encode::encode};

/// The frequency model order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Order {
    /// Order-0: symbol frequencies.
    #[default]
    Zero,
    /// Order-1: symbol frequencies conditioned on the previous symbol.
    One,
}

impl TryFrom<u8> for Order {
    type Error = std::io::Error;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid rANS order: {b}"),
            )),
        }
    }
}

const LOWER_BOUND: u32 = 1 << 23;
const TOTAL_FREQ_SHIFT: u32 = 12;
const TOTAL_FREQ: u32 = 1 << TOTAL_FREQ_SHIFT;
const STATE_COUNT: usize = 4;

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn t(order: Order, data: &[u8]) -> io::Result<()> {
        let compressed = encode(order, data)?;
        let actual = decode(&mut &compressed[..])?;
        assert_eq!(actual, data, "order = {order:?}, len = {}", data.len());
        Ok(())
    }

    #[test]
    fn test_round_trip_order_0() -> io::Result<()> {
        t(Order::Zero, b"")?;
        t(Order::Zero, b"r")?;
        t(Order::Zero, b"ra")?;
        t(Order::Zero, b"ramune")?;
        t(Order::Zero, b"ramune and more ramune for lunch")?;
        t(Order::Zero, &[0x00; 97])?;
        t(Order::Zero, &(0..=255).collect::<Vec<u8>>())?;

        let mut data = Vec::new();
        for i in 0..4096u32 {
            data.push((i % 7) as u8);
            data.push((i % 3) as u8);
        }
        t(Order::Zero, &data)?;

        Ok(())
    }

    #[test]
    fn test_round_trip_order_1() -> io::Result<()> {
        t(Order::One, b"ramune ramune ramune ramune")?;
        t(Order::One, &[0x41; 1000])?;

        let mut data = Vec::new();
        for i in 0..2048u32 {
            data.extend_from_slice(b"ACGT");
            data.push((i % 11) as u8);
        }
        t(Order::One, &data)?;

        Ok(())
    }

    #[test]
    fn test_round_trip_order_1_with_short_input() -> io::Result<()> {
        // Order-1 inputs shorter than one byte per state fall back to
        // order-0.
        t(Order::One, b"")?;
        t(Order::One, b"ra")?;
        Ok(())
    }

    #[test]
    fn test_decode_with_invalid_order() {
        let data = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(decode(&mut &data[..]).is_err());
    }
}
