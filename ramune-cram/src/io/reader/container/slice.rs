pub(crate) mod header;
pub(crate) mod records;

use std::io;

use self::header::read_header;
use crate::{
    container::{
        self,
        Block,
        block::ContentType,
    },
    file_definition::Version,
};

use super::read_block;

/// A slice: its header, the core bitstream block, and the external blocks.
pub(crate) struct Slice {
    pub(crate) header: container::slice::Header,
    pub(crate) core_data_block: Block,
    pub(crate) external_blocks: Vec<Block>,
}

pub(crate) fn read_slice(src: &mut &[u8], version: Version) -> io::Result<Slice> {
    let header = read_header(src, version)?;

    let mut core_data_block = None;
    let mut external_blocks = Vec::new();

    for _ in 0..header.block_count {
        let block = read_block(src, version)?;

        match block.content_type {
            ContentType::CoreData => {
                if core_data_block.is_some() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "duplicate core data block",
                    ));
                }

                core_data_block = Some(block);
            }
            ContentType::ExternalData => {
                if external_blocks
                    .iter()
                    .any(|b: &Block| b.content_id == block.content_id)
                {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("duplicate block content id: {}", block.content_id),
                    ));
                }

                external_blocks.push(block);
            }
            content_type => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid slice block content type: {content_type:?}"),
                ));
            }
        }
    }

    let core_data_block = core_data_block.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "missing core data block")
    })?;

    Ok(Slice {
        header,
        core_data_block,
        external_blocks,
    })
}
