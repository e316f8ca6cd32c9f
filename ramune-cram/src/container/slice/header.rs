use crate::container::{ReferenceSequenceContext, block};

/// A slice header.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Header {
    pub(crate) reference_sequence_context: ReferenceSequenceContext,
    pub(crate) record_count: usize,
    pub(crate) record_counter: u64,
    pub(crate) block_count: usize,
    pub(crate) block_content_ids: Vec<block::ContentId>,
    pub(crate) embedded_reference_bases_block_content_id: Option<block::ContentId>,
    pub(crate) reference_md5: Option<[u8; 16]>,
    pub(crate) optional_tags: Vec<u8>,
}
