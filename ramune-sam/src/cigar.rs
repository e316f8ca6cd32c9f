//! CIGAR operations.

pub mod op;

pub use self::op::Op;

/// Calculates the number of reference bases an operation list spans.
pub fn alignment_span(ops: &[Op]) -> usize {
    ops.iter()
        .filter(|op| op.kind().consumes_reference())
        .map(|op| op.len())
        .sum()
}

/// Calculates the number of read bases an operation list covers.
pub fn read_length(ops: &[Op]) -> usize {
    ops.iter()
        .filter(|op| op.kind().consumes_read())
        .map(|op| op.len())
        .sum()
}
