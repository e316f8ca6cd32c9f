use std::io;

use super::{
    Flags, LOWER_BOUND, STATE_COUNT, TOTAL_FREQ_SHIFT, TOTAL_FREQ_SHIFT_ORDER_1,
};
use crate::{
    codecs::frequencies::{
        build_cumulative_frequencies, normalize_frequencies, write_frequencies, write_symbols,
    },
    io::writer::num::write_uint7,
};

/// Encodes a byte stream as rANS Nx16.
///
/// Transform flags that do not pay off for the given input (pack with too
/// many symbols, RLE without runs) are dropped from the stored flag byte.
pub fn encode(flags: Flags, src: &[u8]) -> io::Result<Vec<u8>> {
    if flags.contains(Flags::STRIPE) {
        return encode_stripe(flags, src);
    }

    let mut flags = flags;
    let mut dst = vec![0];

    if !flags.contains(Flags::NO_SIZE) {
        let ulen = u32::try_from(src.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        write_uint7(&mut dst, ulen)?;
    }

    let mut data = src.to_vec();

    if flags.contains(Flags::PACK) {
        if let Some((meta, packed)) = pack(&data) {
            dst.extend_from_slice(&meta);
            write_uint7(&mut dst, packed.len() as u32)?;
            data = packed;
        } else {
            flags.remove(Flags::PACK);
        }
    }

    if flags.contains(Flags::RLE) {
        if let Some((meta, literals)) = rle_encode(&data) {
            // An odd stored length marks uncompressed metadata.
            write_uint7(&mut dst, (meta.len() * 2 + 1) as u32)?;
            write_uint7(&mut dst, literals.len() as u32)?;
            dst.extend_from_slice(&meta);
            data = literals;
        } else {
            flags.remove(Flags::RLE);
        }
    }

    // Order-1 needs at least two bytes per state.
    if flags.contains(Flags::ORDER) && data.len() < 2 * STATE_COUNT {
        flags.remove(Flags::ORDER);
    }

    let payload = if flags.contains(Flags::CAT) {
        data.clone()
    } else if flags.contains(Flags::ORDER) {
        encode_order_1(&data)?
    } else {
        encode_order_0(&data)?
    };

    // Store incompressible payloads as-is.
    let payload = if !flags.contains(Flags::CAT) && payload.len() >= data.len() {
        flags.remove(Flags::ORDER);
        flags.insert(Flags::CAT);
        data
    } else {
        payload
    };

    dst[0] = flags.bits();
    dst.extend_from_slice(&payload);

    Ok(dst)
}

fn encode_stripe(flags: Flags, src: &[u8]) -> io::Result<Vec<u8>> {
    if src.len() % STATE_COUNT != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "striped input size must be a multiple of the plane count",
        ));
    }

    let mut dst = vec![Flags::STRIPE.bits()];

    let ulen =
        u32::try_from(src.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_uint7(&mut dst, ulen)?;

    let inner_flags = (flags - Flags::STRIPE) | Flags::NO_SIZE;

    let mut planes = Vec::with_capacity(STATE_COUNT);

    for j in 0..STATE_COUNT {
        let plane: Vec<u8> = src.iter().skip(j).step_by(STATE_COUNT).copied().collect();
        planes.push(encode(inner_flags, &plane)?);
    }

    for plane in &planes {
        write_uint7(&mut dst, plane.len() as u32)?;
    }

    for plane in &planes {
        dst.extend_from_slice(plane);
    }

    Ok(dst)
}

fn pack(src: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    if src.is_empty() {
        return None;
    }

    let mut seen = [false; 256];
    for &b in src {
        seen[usize::from(b)] = true;
    }

    let symbols: Vec<u8> = (0u16..256)
        .filter(|&i| seen[usize::from(i)])
        .map(|i| i as u8)
        .collect();

    if symbols.len() > 16 {
        return None;
    }

    let mut codes = [0u8; 256];
    for (code, &sym) in symbols.iter().enumerate() {
        codes[usize::from(sym)] = code as u8;
    }

    let values_per_byte: usize = match symbols.len() {
        1 => 0,
        2 => 8,
        3..=4 => 4,
        _ => 2,
    };

    let width_field = match values_per_byte {
        0 => 2,
        n => (n - 1) as u8,
    };

    let mut meta = Vec::with_capacity(1 + symbols.len());
    meta.push(width_field | ((symbols.len() as u8) << 3));
    meta.extend_from_slice(&symbols);

    let mut packed = Vec::new();

    match values_per_byte {
        0 => {}
        n => {
            let bits = 8 / n;
            let mut acc = 0u8;
            let mut filled = 0;

            for &b in src {
                acc = (acc << bits) | codes[usize::from(b)];
                filled += 1;

                if filled == n {
                    packed.push(acc);
                    acc = 0;
                    filled = 0;
                }
            }

            if filled > 0 {
                packed.push(acc << (bits * (n - filled)));
            }
        }
    }

    Some((meta, packed))
}

fn rle_encode(src: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    if src.is_empty() {
        return None;
    }

    // First pass: score which symbols benefit from run-length encoding.
    let mut saved = [0i64; 256];
    let mut last = 256usize;

    for &b in src {
        if usize::from(b) == last {
            saved[usize::from(b)] += 1;
        } else {
            saved[usize::from(b)] -= 1;
            last = usize::from(b);
        }
    }

    let run_symbols: Vec<u8> = (0u16..256)
        .filter(|&i| saved[usize::from(i)] > 0)
        .map(|i| i as u8)
        .collect();

    if run_symbols.is_empty() || run_symbols.len() > 255 {
        return None;
    }

    let mut has_run = [false; 256];
    for &sym in &run_symbols {
        has_run[usize::from(sym)] = true;
    }

    let mut meta = Vec::new();
    meta.push(run_symbols.len() as u8);
    meta.extend_from_slice(&run_symbols);

    let mut literals = Vec::new();

    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        literals.push(b);

        if has_run[usize::from(b)] {
            let mut run = 0u32;
            while i + 1 < src.len() && src[i + 1] == b {
                run += 1;
                i += 1;
            }

            write_uint7(&mut meta, run).ok()?;
        }

        i += 1;
    }

    Some((meta, literals))
}

pub(super) fn encode_order_0(src: &[u8]) -> io::Result<Vec<u8>> {
    let mut dst = Vec::new();

    if src.is_empty() {
        return Ok(dst);
    }

    let mut histogram = [0u32; 256];
    for &b in src {
        histogram[usize::from(b)] += 1;
    }

    let freqs = normalize_frequencies(&histogram, 1 << TOTAL_FREQ_SHIFT);
    let cumulative_freqs = build_cumulative_frequencies(&freqs);

    write_frequencies(&mut dst, &freqs)?;

    let mut states = [LOWER_BOUND; STATE_COUNT];
    let mut rev = Vec::new();

    let put = |state: &mut u32, rev: &mut Vec<u8>, sym: u8| {
        put_symbol(
            state,
            rev,
            cumulative_freqs[usize::from(sym)],
            freqs[usize::from(sym)],
            TOTAL_FREQ_SHIFT,
        );
    };

    let n = src.len();
    match n % STATE_COUNT {
        3 => {
            put(&mut states[2], &mut rev, src[n - 1]);
            put(&mut states[1], &mut rev, src[n - 2]);
            put(&mut states[0], &mut rev, src[n - 3]);
        }
        2 => {
            put(&mut states[1], &mut rev, src[n - 1]);
            put(&mut states[0], &mut rev, src[n - 2]);
        }
        1 => {
            put(&mut states[0], &mut rev, src[n - 1]);
        }
        _ => {}
    }

    let mut i = n / STATE_COUNT * STATE_COUNT;

    while i > 0 {
        put(&mut states[3], &mut rev, src[i - 1]);
        put(&mut states[2], &mut rev, src[i - 2]);
        put(&mut states[1], &mut rev, src[i - 3]);
        put(&mut states[0], &mut rev, src[i - 4]);
        i -= STATE_COUNT;
    }

    flush_states(&states, &mut rev);

    rev.reverse();
    dst.extend_from_slice(&rev);

    Ok(dst)
}

fn encode_order_1(src: &[u8]) -> io::Result<Vec<u8>> {
    let mut dst = Vec::new();

    let quarter = src.len() / STATE_COUNT;

    let mut present = [false; 256];
    for &b in src {
        present[usize::from(b)] = true;
    }

    let mut histograms = vec![[0u32; 256]; 256];

    for j in 0..STATE_COUNT {
        let start = j * quarter;
        let end = if j == STATE_COUNT - 1 {
            src.len()
        } else {
            start + quarter
        };

        histograms[0][usize::from(src[start])] += 1;

        for i in start + 1..end {
            histograms[usize::from(src[i - 1])][usize::from(src[i])] += 1;
        }
    }

    let mut freqs = vec![[0u32; 256]; 256];
    let mut cumulative_freqs = vec![[0u32; 256]; 256];
    let mut contexts = [false; 256];

    for i in 0..256 {
        if histograms[i].iter().all(|&f| f == 0) {
            continue;
        }

        contexts[i] = true;
        freqs[i] = normalize_frequencies(&histograms[i], 1 << TOTAL_FREQ_SHIFT_ORDER_1);
        cumulative_freqs[i] = build_cumulative_frequencies(&freqs[i]);
    }

    // Flag byte 0: the frequency table is stored uncompressed.
    dst.push(0);

    write_symbols(&mut dst, &present)?;
    write_context_rows(&mut dst, &contexts, &freqs, &present)?;

    let mut states = [LOWER_BOUND; STATE_COUNT];
    let mut rev = Vec::new();

    let put = |state: &mut u32, rev: &mut Vec<u8>, context: u8, sym: u8| {
        put_symbol(
            state,
            rev,
            cumulative_freqs[usize::from(context)][usize::from(sym)],
            freqs[usize::from(context)][usize::from(sym)],
            TOTAL_FREQ_SHIFT_ORDER_1,
        );
    };

    let mut i3 = src.len() - 1;
    while i3 > STATE_COUNT * quarter - 1 {
        put(&mut states[3], &mut rev, src[i3 - 1], src[i3]);
        i3 -= 1;
    }

    for i in (1..quarter).rev() {
        put(&mut states[3], &mut rev, src[3 * quarter + i - 1], src[3 * quarter + i]);
        put(&mut states[2], &mut rev, src[2 * quarter + i - 1], src[2 * quarter + i]);
        put(&mut states[1], &mut rev, src[quarter + i - 1], src[quarter + i]);
        put(&mut states[0], &mut rev, src[i - 1], src[i]);
    }

    put(&mut states[3], &mut rev, 0, src[3 * quarter]);
    put(&mut states[2], &mut rev, 0, src[2 * quarter]);
    put(&mut states[1], &mut rev, 0, src[quarter]);
    put(&mut states[0], &mut rev, 0, src[0]);

    flush_states(&states, &mut rev);

    rev.reverse();
    dst.extend_from_slice(&rev);

    Ok(dst)
}

fn write_context_rows(
    dst: &mut Vec<u8>,
    contexts: &[bool; 256],
    freqs: &[[u32; 256]],
    present: &[bool; 256],
) -> io::Result<()> {
    let mut rle = 0;

    for i in 0..256 {
        if !contexts[i] {
            continue;
        }

        if rle > 0 {
            rle -= 1;
        } else {
            dst.push(i as u8);

            if i > 0 && contexts[i - 1] {
                let mut run = 0;
                while i + 1 + run < 256 && contexts[i + 1 + run] {
                    run += 1;
                }

                dst.push(run as u8);
                rle = run;
            }
        }

        write_row_frequencies(dst, &freqs[i], present);
    }

    dst.push(0);

    Ok(())
}

/// Writes one order-1 row: frequencies for the symbols in `present`, with
/// zero runs stored as a 0 byte plus an extra-zeros count.
fn write_row_frequencies(dst: &mut Vec<u8>, freqs: &[u32; 256], present: &[bool; 256]) {
    let mut zero_run: u32 = 0;

    for (sym, &is_present) in present.iter().enumerate() {
        if !is_present {
            continue;
        }

        let f = freqs[sym];

        if f == 0 {
            zero_run += 1;
            continue;
        }

        flush_zero_run(dst, &mut zero_run);

        if f < 0x80 {
            dst.push(f as u8);
        } else {
            dst.push(0x80 | (f >> 8) as u8);
            dst.push(f as u8);
        }
    }

    flush_zero_run(dst, &mut zero_run);
}

fn flush_zero_run(dst: &mut Vec<u8>, zero_run: &mut u32) {
    if *zero_run > 0 {
        dst.push(0);
        dst.push((*zero_run - 1) as u8);
        *zero_run = 0;
    }
}

fn put_symbol(state: &mut u32, rev: &mut Vec<u8>, start: u32, freq: u32, shift: u32) {
    let x_max = ((LOWER_BOUND >> shift) << 16) * freq;

    let mut x = *state;
    while x >= x_max {
        rev.push((x >> 8) as u8);
        rev.push(x as u8);
        x >>= 16;
    }

    *state = ((x / freq) << shift) + (x % freq) + start;
}

fn flush_states(states: &[u32; STATE_COUNT], rev: &mut Vec<u8>) {
    // States are read front-to-back as little-endian u32s, so they are
    // pushed back-to-front with bytes most-significant first.
    for state in states.iter().rev() {
        rev.push((state >> 24) as u8);
        rev.push((state >> 16) as u8);
        rev.push((state >> 8) as u8);
        rev.push(*state as u8);
    }
}
