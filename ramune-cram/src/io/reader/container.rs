//! CRAM container reading.

pub(crate) mod block;
pub(crate) mod compression_header;
pub(crate) mod header;
pub(crate) mod slice;

use std::{
    io::{self, Read},
    iter,
};

pub(crate) use self::{
    block::{read_block, read_block_as},
    compression_header::read_compression_header,
    slice::{Slice, read_slice},
};
use crate::{
    container::{CompressionHeader, Header},
    file_definition::Version,
};

/// A CRAM container: the decoded header plus the raw body bytes.
#[derive(Default)]
pub struct Container {
    pub(crate) header: Header,
    pub(crate) src: Vec<u8>,
    pub(crate) version: Version,
}

impl Container {
    /// Returns the container header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Reads the compression header block at the start of the body.
    pub(crate) fn compression_header(&self) -> io::Result<CompressionHeader> {
        let end = self
            .header
            .landmarks
            .first()
            .copied()
            .unwrap_or(self.src.len());

        let src = self
            .src
            .get(..end)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid landmark"))?;

        read_compression_header(&mut &src[..], self.version)
    }

    /// Returns an iterator over the slices in the body, located by the
    /// header landmarks.
    pub(crate) fn slices(&self) -> impl Iterator<Item = io::Result<Slice>> + '_ {
        let landmarks = &self.header.landmarks;
        let version = self.version;
        let mut i = 0;

        iter::from_fn(move || {
            let start = *landmarks.get(i)?;
            let end = landmarks.get(i + 1).copied().unwrap_or(self.src.len());
            i += 1;

            let Some(mut src) = self.src.get(start..end) else {
                return Some(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid landmark",
                )));
            };

            Some(read_slice(&mut src, version))
        })
    }
}

/// Reads the next container into `container`, reusing its buffers.
///
/// This returns the container body length, or 0 at the EOF container or end
/// of stream.
pub(crate) fn read_container<R>(
    reader: &mut R,
    container: &mut Container,
    version: Version,
) -> io::Result<usize>
where
    R: Read,
{
    container.version = version;

    match header::read_header(reader, &mut container.header, version)? {
        0 => Ok(0),
        len => {
            container.src.resize(len, 0);
            reader.read_exact(&mut container.src)?;
            Ok(len)
        }
    }
}
