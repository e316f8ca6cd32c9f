/// An encoding kind, as serialized in the compression header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Kind {
    Null,
    External,
    Golomb,
    Huffman,
    ByteArrayLength,
    ByteArrayStop,
    Beta,
    Subexp,
    GolombRice,
    Gamma,
    /// The bit-packing transform (`xpack`).
    Pack,
    /// The run-length transform (`xrle`).
    Rle,
}

impl From<Kind> for i32 {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Null => 0,
            Kind::External => 1,
            Kind::Golomb => 2,
            Kind::Huffman => 3,
            Kind::ByteArrayLength => 4,
            Kind::ByteArrayStop => 5,
            Kind::Beta => 6,
            Kind::Subexp => 7,
            Kind::GolombRice => 8,
            Kind::Gamma => 9,
            Kind::Pack => 45,
            Kind::Rle => 46,
        }
    }
}
