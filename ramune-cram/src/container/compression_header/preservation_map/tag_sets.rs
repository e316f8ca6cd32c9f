use std::io;

/// A tag descriptor: a two-byte tag name and its value type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct TagDescriptor {
    pub(crate) tag: [u8; 2],
    pub(crate) ty: u8,
}

/// The tag dictionary (`TD`): the distinct ordered tag sets records in the
/// container carry, indexed by the `TL` data series.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct TagSets(Vec<Vec<TagDescriptor>>);

impl TagSets {
    /// Returns the tag set with the given index.
    pub fn get(&self, i: usize) -> Option<&[TagDescriptor]> {
        self.0.get(i).map(|set| set.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, set: Vec<TagDescriptor>) {
        self.0.push(set);
    }

    /// Returns the index of the given set, if present.
    pub fn position(&self, set: &[TagDescriptor]) -> Option<usize> {
        self.0.iter().position(|s| s == set)
    }

    /// Parses the dictionary from its serialized form: NUL-terminated lines
    /// of tag descriptor triplets.
    pub fn decode(src: &[u8]) -> io::Result<Self> {
        let mut sets = Vec::new();

        let mut lines = src.split(|&b| b == 0x00);

        // The serialization ends with a trailing NUL, so the final split
        // entry is empty.
        let last = lines.next_back();
        if !src.is_empty() && last.is_some_and(|line| !line.is_empty()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unterminated tag dictionary line",
            ));
        }

        for line in lines {
            if line.len() % 3 != 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid tag dictionary line length",
                ));
            }

            let set = line
                .chunks_exact(3)
                .map(|chunk| TagDescriptor {
                    tag: [chunk[0], chunk[1]],
                    ty: chunk[2],
                })
                .collect();

            sets.push(set);
        }

        Ok(Self(sets))
    }

    /// Serializes the dictionary.
    pub fn encode(&self) -> Vec<u8> {
        let mut dst = Vec::new();

        for set in &self.0 {
            for descriptor in set {
                dst.extend_from_slice(&descriptor.tag);
                dst.push(descriptor.ty);
            }

            dst.push(0x00);
        }

        dst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() -> io::Result<()> {
        let mut tag_sets = TagSets::default();
        tag_sets.push(Vec::new());
        tag_sets.push(vec![
            TagDescriptor {
                tag: *b"NH",
                ty: b'c',
            },
            TagDescriptor {
                tag: *b"MD",
                ty: b'Z',
            },
        ]);

        let encoded = tag_sets.encode();
        assert_eq!(encoded, b"\x00NHcMDZ\x00");

        let decoded = TagSets::decode(&encoded)?;
        assert_eq!(decoded, tag_sets);

        Ok(())
    }

    #[test]
    fn test_decode_empty() -> io::Result<()> {
        let tag_sets = TagSets::decode(b"")?;
        assert_eq!(tag_sets.len(), 0);
        Ok(())
    }

    #[test]
    fn test_decode_with_invalid_line() {
        assert!(TagSets::decode(b"NH\x00").is_err());
        assert!(TagSets::decode(b"NHc").is_err());
    }
}
