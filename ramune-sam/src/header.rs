//! Minimal SAM header model.

use std::io;

use bstr::{BStr, BString, ByteSlice};
use indexmap::IndexMap;

/// A minimal SAM header.
///
/// The raw header text is kept verbatim; only the fields the alignment
/// formats need for record resolution are parsed out of it: the reference
/// sequence dictionary (`@SQ` `SN`/`LN`) and the read group ids (`@RG` `ID`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    text: BString,
    reference_sequences: IndexMap<BString, usize>,
    read_group_ids: Vec<BString>,
}

impl Header {
    /// Parses a header from raw SAM header text.
    ///
    /// # Examples
    ///
    /// ```
    /// use ramune_sam::Header;
    /// let header = Header::from_text(b"@SQ\tSN:sq0\tLN:8\n")?;
    /// assert_eq!(header.reference_sequences().len(), 1);
    /// # Ok::<_, std::io::Error>(())
    /// ```
    pub fn from_text(text: &[u8]) -> io::Result<Self> {
        let mut reference_sequences = IndexMap::new();
        let mut read_group_ids = Vec::new();

        for line in text.lines() {
            if let Some(fields) = line.strip_prefix(b"@SQ\t") {
                let (name, length) = parse_reference_sequence(fields)?;

                if reference_sequences.insert(name.clone(), length).is_some() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("duplicate reference sequence name: {name}"),
                    ));
                }
            } else if let Some(fields) = line.strip_prefix(b"@RG\t") {
                read_group_ids.push(parse_read_group_id(fields)?);
            }
        }

        Ok(Self {
            text: text.into(),
            reference_sequences,
            read_group_ids,
        })
    }

    /// Returns the raw header text.
    pub fn text(&self) -> &BStr {
        self.text.as_bstr()
    }

    /// Returns the reference sequence dictionary (name to length).
    pub fn reference_sequences(&self) -> &IndexMap<BString, usize> {
        &self.reference_sequences
    }

    /// Returns the name of the reference sequence with the given index.
    pub fn reference_sequence_name(&self, id: usize) -> Option<&BStr> {
        self.reference_sequences
            .get_index(id)
            .map(|(name, _)| name.as_bstr())
    }

    /// Returns the length of the reference sequence with the given index.
    pub fn reference_sequence_len(&self, id: usize) -> Option<usize> {
        self.reference_sequences
            .get_index(id)
            .map(|(_, length)| *length)
    }

    /// Returns the index of the reference sequence with the given name.
    pub fn reference_sequence_id(&self, name: &[u8]) -> Option<usize> {
        self.reference_sequences.get_index_of(name.as_bstr())
    }

    /// Returns the read group ids, in header order.
    pub fn read_group_ids(&self) -> &[BString] {
        &self.read_group_ids
    }
}

fn parse_reference_sequence(fields: &[u8]) -> io::Result<(BString, usize)> {
    let mut name = None;
    let mut length = None;

    for field in fields.split_str("\t") {
        if let Some(value) = field.strip_prefix(b"SN:") {
            name = Some(BString::from(value));
        } else if let Some(value) = field.strip_prefix(b"LN:") {
            let s = value
                .to_str()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let n: usize = s
                .parse()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            length = Some(n);
        }
    }

    match (name, length) {
        (Some(name), Some(length)) => Ok((name, length)),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid @SQ line: missing SN or LN",
        )),
    }
}

fn parse_read_group_id(fields: &[u8]) -> io::Result<BString> {
    fields
        .split_str("\t")
        .find_map(|field| field.strip_prefix(b"ID:"))
        .map(BString::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid @RG line: missing ID"))
}
