pub(crate) mod byte;
pub(crate) mod byte_array;
pub(crate) mod integer;

pub(crate) use self::{byte::Byte, byte_array::ByteArray, integer::Integer};
