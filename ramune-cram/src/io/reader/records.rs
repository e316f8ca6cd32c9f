use std::{
    collections::VecDeque,
    io::{self, Read},
};

use ramune_sam as sam;

use super::{Container, Reader, options::Range};
use crate::{Record, container::ReferenceSequenceContext};

/// An iterator over the records of all remaining containers.
///
/// Records are yielded in container, slice, and within-slice order.
pub struct Records<'r, 'h, R> {
    reader: &'r mut Reader<R>,
    header: &'h sam::Header,
    container: Container,
    records: VecDeque<Record>,
    eof: bool,
}

impl<'r, 'h, R> Records<'r, 'h, R>
where
    R: Read,
{
    pub(super) fn new(reader: &'r mut Reader<R>, header: &'h sam::Header) -> Self {
        Self {
            reader,
            header,
            container: Container::default(),
            records: VecDeque::new(),
            eof: false,
        }
    }

    /// Reads the next container and decodes all of its records.
    ///
    /// Containers and slices that fall entirely outside a query range are
    /// skipped without decoding.
    fn read_container_records(&mut self) -> io::Result<()> {
        if self.reader.read_container(&mut self.container)? == 0 {
            self.eof = true;
            return Ok(());
        }

        let range = self.reader.options().range;

        if let Some(range) = range {
            if !overlaps(self.container.header().reference_sequence_context(), range) {
                return Ok(());
            }
        }

        let compression_header = self.container.compression_header()?;

        #[cfg(not(feature = "parallel"))]
        {
            for result in self.container.slices() {
                let slice = result?;

                if let Some(range) = range {
                    if !overlaps(slice.header.reference_sequence_context, range) {
                        continue;
                    }
                }

                let records = slice.records(
                    &compression_header,
                    self.header,
                    self.reader.reference_sequence_repository(),
                    self.reader.options(),
                )?;

                match range {
                    Some(range) => self.records.extend(
                        records
                            .into_iter()
                            .filter(|record| record_overlaps(record, range)),
                    ),
                    None => self.records.extend(records),
                }
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let slices = self
                .container
                .slices()
                .collect::<io::Result<Vec<_>>>()?;

            let decoded = slices
                .par_iter()
                .filter(|slice| match range {
                    Some(range) => overlaps(slice.header.reference_sequence_context, range),
                    None => true,
                })
                .map(|slice| {
                    slice.records(
                        &compression_header,
                        self.header,
                        self.reader.reference_sequence_repository(),
                        self.reader.options(),
                    )
                })
                .collect::<io::Result<Vec<_>>>()?;

            for records in decoded {
                match range {
                    Some(range) => self.records.extend(
                        records
                            .into_iter()
                            .filter(|record| record_overlaps(record, range)),
                    ),
                    None => self.records.extend(records),
                }
            }
        }

        Ok(())
    }
}

/// Returns whether a group of records may contain records in the range.
fn overlaps(context: ReferenceSequenceContext, range: Range) -> bool {
    match context {
        ReferenceSequenceContext::Some {
            reference_sequence_id,
            alignment_start,
            alignment_end,
        } => {
            reference_sequence_id == range.reference_sequence_id
                && alignment_start <= range.end
                && range.start <= alignment_end
        }
        ReferenceSequenceContext::None => false,
        // Multi-reference groups cannot be rejected without decoding.
        ReferenceSequenceContext::Many => true,
    }
}

fn record_overlaps(record: &Record, range: Range) -> bool {
    let (Some(id), Some(start)) = (record.reference_sequence_id(), record.alignment_start())
    else {
        return false;
    };

    let end = record.alignment_end().unwrap_or(start);

    id == range.reference_sequence_id && start <= range.end && range.start <= end
}

impl<R> Iterator for Records<'_, '_, R>
where
    R: Read,
{
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.records.pop_front() {
                return Some(Ok(record));
            }

            if self.eof {
                return None;
            }

            if let Err(e) = self.read_container_records() {
                self.eof = true;
                return Some(Err(e));
            }
        }
    }
}
