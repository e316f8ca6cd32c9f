use std::io;

use super::{
    Flags, LOWER_BOUND, STATE_COUNT, TOTAL_FREQ_SHIFT, TOTAL_FREQ_SHIFT_ORDER_1,
};
use crate::{
    codecs::frequencies::{
        SymbolTable, normalize_frequencies, read_frequencies, read_symbols,
    },
    io::reader::num::{read_u8, read_u32_le, read_uint7, read_uint7_as},
};

/// Decodes a rANS Nx16 stream.
///
/// `len` is the uncompressed size the caller expects; it is required when
/// the stream was written without one (`Flags::NO_SIZE`).
pub fn decode(src: &mut &[u8], len: Option<usize>) -> io::Result<Vec<u8>> {
    let flags = Flags::from_bits_retain(read_u8(src)?);

    if flags.contains(Flags::STRIPE) {
        return decode_stripe(src);
    }

    let ulen = if flags.contains(Flags::NO_SIZE) {
        len.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "rANS stream has no stored size and none was given",
            )
        })?
    } else {
        read_uint7_as(src)?
    };

    let mut pack = None;
    let mut rans_len = ulen;

    if flags.contains(Flags::PACK) {
        let meta = read_pack_meta(src)?;
        rans_len = read_uint7_as(src)?;
        pack = Some(meta);
    }

    let mut rle = None;

    if flags.contains(Flags::RLE) {
        let (meta, rle_len) = read_rle_meta(src)?;
        let expanded_len = rans_len;
        rans_len = rle_len;
        rle = Some((meta, expanded_len));
    }

    let mut data = if flags.contains(Flags::CAT) {
        let buf = src
            .split_off(..rans_len)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buf.to_vec()
    } else if flags.contains(Flags::ORDER) {
        decode_order_1(src, rans_len)?
    } else {
        decode_order_0(src, rans_len)?
    };

    if let Some((meta, expanded_len)) = rle {
        data = decode_rle(&data, &mut &meta[..], expanded_len)?;
    }

    if let Some((values_per_byte, map)) = pack {
        data = unpack(&data, values_per_byte, &map, ulen)?;
    }

    if data.len() != ulen {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "rANS stream size mismatch",
        ));
    }

    Ok(data)
}

fn decode_stripe(src: &mut &[u8]) -> io::Result<Vec<u8>> {
    let ulen: usize = read_uint7_as(src)?;

    if ulen % STATE_COUNT != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "striped stream size is not a multiple of the plane count",
        ));
    }

    let mut plane_sizes = [0; STATE_COUNT];
    for size in &mut plane_sizes {
        *size = read_uint7_as(src)?;
    }

    let plane_len = ulen / STATE_COUNT;
    let mut planes = Vec::with_capacity(STATE_COUNT);

    for &size in &plane_sizes {
        let mut buf = src
            .split_off(..size)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        let plane = decode(&mut buf, Some(plane_len))?;

        if plane.len() != plane_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "striped plane size mismatch",
            ));
        }

        planes.push(plane);
    }

    let mut dst = Vec::with_capacity(ulen);

    for i in 0..plane_len {
        for plane in &planes {
            dst.push(plane[i]);
        }
    }

    Ok(dst)
}

fn read_pack_meta(src: &mut &[u8]) -> io::Result<(usize, Vec<u8>)> {
    let b0 = read_u8(src)?;

    // Low 3 bits hold values-per-byte - 1 (2, 4, or 8), or 2 for a
    // constant stream; the high 5 bits hold the symbol map length.
    let values_per_byte = match (b0 & 0x07) + 1 {
        3 => 0,
        n => usize::from(n),
    };

    let map_len = usize::from(b0 >> 3);

    if map_len > 16 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid pack symbol map length",
        ));
    }

    let map = src
        .split_off(..map_len)
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

    Ok((values_per_byte, map.to_vec()))
}

fn unpack(data: &[u8], values_per_byte: usize, map: &[u8], ulen: usize) -> io::Result<Vec<u8>> {
    let lookup = |code: usize| {
        map.get(code).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "invalid pack symbol code")
        })
    };

    let mut dst = Vec::with_capacity(ulen);

    match values_per_byte {
        0 => {
            let b = lookup(0)?;
            dst.resize(ulen, b);
        }
        2 => {
            for &b in data {
                dst.push(lookup(usize::from(b >> 4))?);

                if dst.len() < ulen {
                    dst.push(lookup(usize::from(b & 0x0f))?);
                }

                if dst.len() == ulen {
                    break;
                }
            }
        }
        4 => {
            'outer: for &b in data {
                for shift in [6, 4, 2, 0] {
                    dst.push(lookup(usize::from((b >> shift) & 0x03))?);

                    if dst.len() == ulen {
                        break 'outer;
                    }
                }
            }
        }
        8 => {
            'outer: for &b in data {
                for shift in (0..8).rev() {
                    dst.push(lookup(usize::from((b >> shift) & 0x01))?);

                    if dst.len() == ulen {
                        break 'outer;
                    }
                }
            }
        }
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid pack width",
            ));
        }
    }

    if dst.len() != ulen {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "packed stream too short",
        ));
    }

    Ok(dst)
}

fn read_rle_meta(src: &mut &[u8]) -> io::Result<(Vec<u8>, usize)> {
    let raw_meta_len = read_uint7(src)? as usize;
    let rle_len: usize = read_uint7_as(src)?;

    // An odd length marks uncompressed metadata.
    let meta = if raw_meta_len % 2 == 1 {
        let meta_len = raw_meta_len / 2;
        src.split_off(..meta_len)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?
            .to_vec()
    } else {
        let meta_len = raw_meta_len / 2;
        let compressed_meta_len: usize = read_uint7_as(src)?;

        let mut buf = src
            .split_off(..compressed_meta_len)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        decode_order_0(&mut buf, meta_len)?
    };

    Ok((meta, rle_len))
}

fn decode_rle(literals: &[u8], meta: &mut &[u8], expected_len: usize) -> io::Result<Vec<u8>> {
    let sym_count = usize::from(read_u8(meta)?);

    let mut has_run = [false; 256];
    for _ in 0..sym_count {
        has_run[usize::from(read_u8(meta)?)] = true;
    }

    let mut dst = Vec::with_capacity(expected_len);

    for &b in literals {
        if has_run[usize::from(b)] {
            let mut run = read_uint7(meta)? as usize + 1;
            run = run.min(expected_len - dst.len());
            dst.resize(dst.len() + run, b);
        } else {
            if dst.len() >= expected_len {
                break;
            }

            dst.push(b);
        }
    }

    if dst.len() != expected_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "run-length stream size mismatch",
        ));
    }

    Ok(dst)
}

pub(super) fn decode_order_0(src: &mut &[u8], ulen: usize) -> io::Result<Vec<u8>> {
    let mut dst = vec![0; ulen];

    if ulen == 0 {
        return Ok(dst);
    }

    let freqs = read_frequencies(src)?;
    let table = SymbolTable::new(&freqs, TOTAL_FREQ_SHIFT)?;

    let mut states = read_states(src)?;

    let mask = (1 << TOTAL_FREQ_SHIFT) - 1;
    let end = ulen / STATE_COUNT * STATE_COUNT;

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

    for (j, b) in dst[end..].iter_mut().enumerate() {
        *b = table.symbol(states[j] & mask);
    }

    Ok(dst)
}

fn decode_order_1(src: &mut &[u8], ulen: usize) -> io::Result<Vec<u8>> {
    let mut dst = vec![0; ulen];

    if ulen == 0 {
        return Ok(dst);
    }

    // A leading 1 marks an entropy-coded frequency table.
    let is_compressed = read_u8(src)? == 1;

    let tables = if is_compressed {
        let table_len: usize = read_uint7_as(src)?;
        let compressed_table_len: usize = read_uint7_as(src)?;

        let mut buf = src
            .split_off(..compressed_table_len)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        let expanded = decode_order_0(&mut buf, table_len)?;
        read_context_tables(&mut &expanded[..])?
    } else {
        read_context_tables(src)?
    };

    let mut states = read_states(src)?;

    let mask = (1 << TOTAL_FREQ_SHIFT_ORDER_1) - 1;
    let quarter = ulen / STATE_COUNT;
    let mut positions = [0, quarter, 2 * quarter, 3 * quarter];
    let mut contexts = [0usize; STATE_COUNT];

    while positions[0] < quarter {
        for j in 0..STATE_COUNT {
            let table = tables[contexts[j]].as_ref().ok_or_else(missing_context)?;

            let slot = states[j] & mask;
            let b = table.symbol(slot);

            dst[positions[j]] = b;
            states[j] = table.advance(states[j], slot);
            renormalize(&mut states[j], src);

            contexts[j] = usize::from(b);
            positions[j] += 1;
        }
    }

    while positions[3] < ulen {
        let table = tables[contexts[3]].as_ref().ok_or_else(missing_context)?;

        let slot = states[3] & mask;
        let b = table.symbol(slot);

        dst[positions[3]] = b;
        states[3] = table.advance(states[3], slot);
        renormalize(&mut states[3], src);

        contexts[3] = usize::from(b);
        positions[3] += 1;
    }

    Ok(dst)
}

fn missing_context() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        "missing order-1 frequency table",
    )
}

fn read_context_tables(src: &mut &[u8]) -> io::Result<Box<[Option<SymbolTable>; 256]>> {
    let present = read_symbols(src)?;

    let mut tables: Box<[Option<SymbolTable>; 256]> = vec![None; 256]
        .try_into()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid table allocation"))?;

    let mut sym = read_u8(src)?;
    let mut rle = 0u32;

    loop {
        let freqs = read_row_frequencies(src, &present)?;
        tables[usize::from(sym)] = Some(SymbolTable::new(&freqs, TOTAL_FREQ_SHIFT_ORDER_1)?);

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

/// Reads one order-1 row: frequencies for the symbols in `present`, with
/// zero runs stored as a 0 byte plus an extra-zeros count.
fn read_row_frequencies(src: &mut &[u8], present: &[bool; 256]) -> io::Result<[u32; 256]> {
    let mut freqs = [0; 256];
    let mut total = 0;
    let mut zero_run = 0u32;

    for (sym, &is_present) in present.iter().enumerate() {
        if !is_present {
            continue;
        }

        if zero_run > 0 {
            zero_run -= 1;
            continue;
        }

        let mut f = u32::from(read_u8(src)?);

        if f >= 0x80 {
            f = ((f & 0x7f) << 8) | u32::from(read_u8(src)?);
        }

        if f == 0 {
            zero_run = u32::from(read_u8(src)?);
            continue;
        }

        freqs[sym] = f;
        total += f;
    }

    let target = 1 << TOTAL_FREQ_SHIFT_ORDER_1;

    // Rows may store pre-normalization frequencies to save space.
    if total > 0 && total < target {
        freqs = normalize_frequencies(&freqs, target);
    }

    Ok(freqs)
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
    if *state < LOWER_BOUND {
        let Some((buf, rest)) = src.split_first_chunk() else {
            return;
        };

        *state = (*state << 16) | u32::from(u16::from_le_bytes(*buf));
        *src = rest;
    }
}
