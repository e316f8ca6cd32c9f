use std::io;

use super::encoding::read_byte_array_encoding;
use crate::{
    container::compression_header::TagEncodings,
    file_definition::Version,
    io::reader::{collections::read_map, num::read_itf8},
};

pub(super) fn read_tag_encodings(
    src: &mut &[u8],
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<TagEncodings> {
    let (mut buf, len) = read_map(src)?;
    read_tag_encodings_inner(&mut buf, len, version, codec_ids)
}

fn read_tag_encodings_inner(
    src: &mut &[u8],
    len: usize,
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<TagEncodings> {
    let mut encodings = TagEncodings::with_capacity(len);

    for _ in 0..len {
        let key = read_itf8(src)?;
        let encoding = read_byte_array_encoding(src, version, codec_ids)?;
        encodings.insert(key, encoding);
    }

    Ok(encodings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::compression_header::{
        Encoding, encoding::codec::ByteArray, tag_encodings,
    };

    #[test]
    fn test_read_tag_encodings() -> io::Result<()> {
        let src = [
            0x09, // map size in bytes
            0x01, // item count = 1
            0xe0, 0x4e, 0x48, 0x63, // key = NH:c
            0x05, 0x02, 0x00, 0x07, // byte array stop(0, 7)
        ];

        let mut codec_ids = 0;
        let actual = read_tag_encodings(&mut &src[..], Version::V3_0, &mut codec_ids)?;

        let key = tag_encodings::key(*b"NH", b'c');
        assert_eq!(
            actual.get(&key),
            Some(&Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: 0x00,
                block_content_id: 7,
            }))
        );

        Ok(())
    }
}
