use std::io::{self, Write};

use super::encoding::write_byte_array_encoding;
use crate::{
    container::compression_header::TagEncodings,
    io::writer::{collections::write_map, num::write_itf8},
};

pub(super) fn write_tag_encodings<W>(
    writer: &mut W,
    tag_encodings: &TagEncodings,
) -> io::Result<()>
where
    W: Write,
{
    let mut items = Vec::new();

    for (key, encoding) in tag_encodings {
        write_itf8(&mut items, *key)?;
        write_byte_array_encoding(&mut items, encoding)?;
    }

    write_map(writer, tag_encodings.len(), &items)
}
