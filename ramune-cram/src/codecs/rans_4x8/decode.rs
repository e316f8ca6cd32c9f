use std::io;

use super::{LOWER_BOUND, Order, STATE_COUNT, TOTAL_FREQ, TOTAL_FREQ_SHIFT};
use crate::codecs::frequencies::{SymbolTable, read_frequencies};
use crate::io::reader::num::{read_u8, read_u32_le};

/// Decodes a rANS 4x8 stream.
pub fn decode(src: &mut &[u8]) -> io::Result<Vec<u8>> {
    let order = read_u8(src).and_then(|b| Order::try_from(b))?;

    let compressed_size = read_u32_le(src).map(|n| n as usize)?;
    let uncompressed_size = read_u32_le(src).map(|n| n as usize)?;

    let Some((mut buf, rest)) = src.split_at_checked(compressed_size) else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };

    *src = rest;

    let mut dst = vec![0; uncompressed_size];

    if uncompressed_size == 0 {
        return Ok(dst);
    }

    match order {
        Order::Zero => decode_order_0(&mut buf, &mut dst)?,
        Order::One => decode_order_1(&mut buf, &mut dst)?,
    }

    Ok(dst)
}

fn decode_order_0(src: &mut &[u8], dst: &mut [u8]) -> io::Result<()> {
    let freqs = read_frequencies(src)?;
    let table = SymbolTable::new(&freqs, TOTAL_FREQ_SHIFT)?;

    let mut states = read_states(src)?;

    let mask = TOTAL_FREQ - 1;
    let end = dst.len() / STATE_COUNT * STATE_COUNT;

    let mut i = 0;

    while i < end {
        for (j, state) in states.iter_mut().enumerate() {
            let slot = *state & mask;
            dst[i + j] = table.symbol(slot);
            *state = table.advance(*state, slot);
            renormalize(state, src);
        }

        i += STATE_COUNT;
    }

    // The remaining 1-3 symbols only peek the states.
    for (j, b) in dst[end..].iter_mut().enumerate() {
        *b = table.symbol(states[j] & mask);
    }

    Ok(())
}

fn decode_order_1(src: &mut &[u8], dst: &mut [u8]) -> io::Result<()> {
    let tables = read_context_tables(src)?;

    let mut states = read_states(src)?;

    let mask = TOTAL_FREQ - 1;
    let quarter = dst.len() / STATE_COUNT;
    let mut positions = [0, quarter, 2 * quarter, 3 * quarter];
    let mut contexts = [0usize; STATE_COUNT];

    while positions[0] < quarter {
        for j in 0..STATE_COUNT {
            let table = context_table(&tables, contexts[j])?;

            let slot = states[j] & mask;
            let b = table.symbol(slot);

            dst[positions[j]] = b;
            states[j] = table.advance(states[j], slot);
            renormalize(&mut states[j], src);

            contexts[j] = usize::from(b);
            positions[j] += 1;
        }
    }

    // State 3 carries the 1-3 symbol tail past the last full quarter.
    while positions[3] < dst.len() {
        let table = context_table(&tables, contexts[3])?;

        let slot = states[3] & mask;
        let b = table.symbol(slot);

        dst[positions[3]] = b;
        states[3] = table.advance(states[3], slot);
        renormalize(&mut states[3], src);

        contexts[3] = usize::from(b);
        positions[3] += 1;
    }

    Ok(())
}

fn context_table<'a>(
    tables: &'a [Option<SymbolTable>; 256],
    context: usize,
) -> io::Result<&'a SymbolTable> {
    tables[context].as_ref().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("missing order-1 frequency table for context {context}"),
        )
    })
}

fn read_context_tables(src: &mut &[u8]) -> io::Result<Box<[Option<SymbolTable>; 256]>> {
    let mut tables: Box<[Option<SymbolTable>; 256]> =
        vec![None; 256].try_into().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "invalid table allocation")
        })?;

    let mut sym = read_u8(src)?;
    let mut rle = 0u32;

    loop {
        let freqs = read_frequencies(src)?;
        tables[usize::from(sym)] = Some(SymbolTable::new(&freqs, TOTAL_FREQ_SHIFT)?);

        if rle == 0 && sym < u8::MAX && src.first().copied() == Some(sym + 1) {
            sym = read_u8(src)?;
            rle = u32::from(read_u8(src)?);
        } else if rle > 0 {
            rle -= 1;
            sym = sym.wrapping_add(1);
        } else {
            sym = read_u8(src)?;
        }

        if sym == 0 {
            break;
        }
    }

    Ok(tables)
}

fn read_states(src: &mut &[u8]) -> io::Result<[u32; STATE_COUNT]> {
    let mut states = [0; STATE_COUNT];

    for state in &mut states {
        *state = read_u32_le(src)?;

        if *state < LOWER_BOUND {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid rANS state",
            ));
        }
    }

    Ok(states)
}

fn renormalize(state: &mut u32, src: &mut &[u8]) {
    while *state < LOWER_BOUND {
        let Some((b, rest)) = src.split_first() else {
            return;
        };

        *state = (*state << 8) | u32::from(*b);
        *src = rest;
    }
}
