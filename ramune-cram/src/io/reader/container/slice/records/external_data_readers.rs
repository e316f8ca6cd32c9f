use std::{collections::HashMap, io};

use crate::container::block;

/// Readers over the uncompressed external block buffers of a slice, keyed
/// by block content id.
///
/// Transform codecs additionally materialize whole data series here, keyed
/// by codec id, so repeated per-record reads share one expansion.
pub(crate) struct ExternalDataReaders<'de> {
    readers: HashMap<block::ContentId, &'de [u8]>,
    expanded: HashMap<u32, ExpandedSeries>,
}

impl<'de> ExternalDataReaders<'de> {
    pub fn new() -> Self {
        Self {
            readers: HashMap::new(),
            expanded: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: block::ContentId, reader: &'de [u8]) {
        self.readers.insert(id, reader);
    }

    pub fn get_mut(&mut self, id: &block::ContentId) -> Option<&mut &'de [u8]> {
        self.readers.get_mut(id)
    }

    /// Returns the expanded series for `codec_id`, running `init` to
    /// materialize it on first use.
    pub fn expand_with<F>(&mut self, codec_id: u32, init: F) -> io::Result<&mut ExpandedSeries>
    where
        F: FnOnce(&mut Self) -> io::Result<Vec<u8>>,
    {
        if !self.expanded.contains_key(&codec_id) {
            let data = init(self)?;
            self.expanded.insert(codec_id, ExpandedSeries::new(data));
        }

        self.expanded
            .get_mut(&codec_id)
            .ok_or_else(|| io::Error::other("missing expanded series"))
    }
}

/// An expanded transform series with a read cursor.
pub(crate) struct ExpandedSeries {
    data: Vec<u8>,
    position: usize,
}

impl ExpandedSeries {
    fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        let b = self
            .data
            .get(self.position)
            .copied()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        self.position += 1;

        Ok(b)
    }

    pub fn read_exact(&mut self, len: usize) -> io::Result<&[u8]> {
        let buf = self
            .data
            .get(self.position..self.position + len)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        self.position += len;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_runs_init_once() -> io::Result<()> {
        let mut readers = ExternalDataReaders::new();

        let mut calls = 0;

        for _ in 0..2 {
            let series = readers.expand_with(0, |_| {
                calls += 1;
                Ok(vec![0x41, 0x42])
            })?;

            let _ = series;
        }

        assert_eq!(calls, 1);

        Ok(())
    }

    #[test]
    fn test_expanded_series_cursor() -> io::Result<()> {
        let mut series = ExpandedSeries::new(b"rmne".to_vec());

        assert_eq!(series.read_u8()?, b'r');
        assert_eq!(series.read_exact(2)?, b"mn");
        assert_eq!(series.read_u8()?, b'e');
        assert!(series.read_u8().is_err());

        Ok(())
    }
}
