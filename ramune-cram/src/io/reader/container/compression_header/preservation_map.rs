use std::io;

use crate::{
    container::compression_header::preservation_map::{
        Key, PreservationMap, SubstitutionMatrix, TagSets,
    },
    io::reader::{collections::read_map, num::read_u8},
};

pub(super) fn read_preservation_map(src: &mut &[u8]) -> io::Result<PreservationMap> {
    let (mut buf, len) = read_map(src)?;
    read_preservation_map_inner(&mut buf, len)
}

fn read_preservation_map_inner(src: &mut &[u8], len: usize) -> io::Result<PreservationMap> {
    let mut map = PreservationMap::default();

    for _ in 0..len {
        let Some(raw_key) = src.split_off(..2) else {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        };

        let Ok(key) = Key::try_from([raw_key[0], raw_key[1]]) else {
            // Unknown keys are not fatal, but their values have no known
            // framing, so the rest of the map is skipped.
            *src = &src[src.len()..];
            break;
        };

        match key {
            Key::RecordsHaveNames => map.records_have_names = read_bool(src)?,
            Key::AlignmentStartsAreDeltas => map.alignment_starts_are_deltas = read_bool(src)?,
            Key::ReferenceRequired => map.reference_required = read_bool(src)?,
            Key::QualityScoreOrientation => {
                map.quality_scores_use_reference_orientation = read_bool(src)?;
            }
            Key::SubstitutionMatrix => {
                let Some((buf, rest)) = src.split_first_chunk() else {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
                };

                map.substitution_matrix = SubstitutionMatrix::decode(*buf);
                *src = rest;
            }
            Key::TagSets => {
                let buf = crate::io::reader::collections::read_array(src)?;
                map.tag_sets = TagSets::decode(buf)?;
            }
        }
    }

    Ok(map)
}

fn read_bool(src: &mut &[u8]) -> io::Result<bool> {
    match read_u8(src)? {
        0 => Ok(false),
        1 => Ok(true),
        n => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid boolean value: {n}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_preservation_map() -> io::Result<()> {
        let src = [
            0x15, // map size in bytes
            0x05, // item count = 5
            b'R', b'N', 0x00, // records have names = false
            b'A', b'P', 0x00, // alignment starts are deltas = false
            b'R', b'R', 0x01, // reference required = true
            b'S', b'M', 0x1b, 0x1b, 0x1b, 0x1b, 0x1b, // substitution matrix
            b'T', b'D', 0x01, 0x00, // tag sets = [[]]
        ];

        let actual = read_preservation_map(&mut &src[..])?;

        assert!(!actual.records_have_names());
        assert!(!actual.alignment_starts_are_deltas());
        assert!(actual.reference_required());
        assert!(actual.quality_scores_use_reference_orientation());
        assert_eq!(actual.substitution_matrix(), &SubstitutionMatrix::default());
        assert_eq!(actual.tag_sets().len(), 1);

        Ok(())
    }

    #[test]
    fn test_read_preservation_map_with_unknown_key() -> io::Result<()> {
        let src = [
            0x07, // map size in bytes
            0x02, // item count = 2
            b'Z', b'Z', 0x01, // unknown key; the rest of the map is skipped
            b'R', b'N', 0x00,
        ];

        let mut reader = &src[..];
        let actual = read_preservation_map(&mut reader)?;

        // The default survives since the item after the unknown key is
        // skipped with it.
        assert!(actual.records_have_names());
        assert!(reader.is_empty());

        Ok(())
    }
}
