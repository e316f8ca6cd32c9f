use std::io::{self, Write};

use crate::{
    container::compression_header::preservation_map::{Key, PreservationMap},
    io::writer::collections::{write_array, write_map},
};

pub(super) fn write_preservation_map<W>(
    writer: &mut W,
    preservation_map: &PreservationMap,
) -> io::Result<()>
where
    W: Write,
{
    let mut items = Vec::new();
    let mut item_count = 0;

    write_key(&mut items, Key::RecordsHaveNames)?;
    write_bool(&mut items, preservation_map.records_have_names())?;
    item_count += 1;

    write_key(&mut items, Key::AlignmentStartsAreDeltas)?;
    write_bool(&mut items, preservation_map.alignment_starts_are_deltas())?;
    item_count += 1;

    write_key(&mut items, Key::ReferenceRequired)?;
    write_bool(&mut items, preservation_map.reference_required())?;
    item_count += 1;

    write_key(&mut items, Key::QualityScoreOrientation)?;
    write_bool(
        &mut items,
        preservation_map.quality_scores_use_reference_orientation(),
    )?;
    item_count += 1;

    write_key(&mut items, Key::SubstitutionMatrix)?;
    items.write_all(&preservation_map.substitution_matrix().encode())?;
    item_count += 1;

    write_key(&mut items, Key::TagSets)?;
    write_array(&mut items, &preservation_map.tag_sets().encode())?;
    item_count += 1;

    write_map(writer, item_count, &items)
}

fn write_key<W>(writer: &mut W, key: Key) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&<[u8; 2]>::from(key))
}

fn write_bool<W>(writer: &mut W, value: bool) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&[u8::from(value)])
}
