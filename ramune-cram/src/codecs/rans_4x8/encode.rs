use std::io;

use super::{LOWER_BOUND, Order, STATE_COUNT, TOTAL_FREQ, TOTAL_FREQ_SHIFT};
use crate::codecs::frequencies::{
    build_cumulative_frequencies, normalize_frequencies, write_frequencies,
};
use crate::io::writer::num::write_u32_le;

/// Encodes a byte stream as rANS 4x8.
pub fn encode(order: Order, src: &[u8]) -> io::Result<Vec<u8>> {
    // Order-1 needs at least one byte per state.
    let order = if order == Order::One && src.len() < STATE_COUNT {
        Order::Zero
    } else {
        order
    };

    let payload = match order {
        Order::Zero => encode_order_0(src)?,
        Order::One => encode_order_1(src)?,
    };

    let mut dst = Vec::with_capacity(payload.len() + 9);

    dst.push(match order {
        Order::Zero => 0,
        Order::One => 1,
    });

    let compressed_size = u32::try_from(payload.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_u32_le(&mut dst, compressed_size)?;

    let uncompressed_size = u32::try_from(src.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_u32_le(&mut dst, uncompressed_size)?;

    dst.extend_from_slice(&payload);

    Ok(dst)
}

fn encode_order_0(src: &[u8]) -> io::Result<Vec<u8>> {
    let mut dst = Vec::new();

    if src.is_empty() {
        return Ok(dst);
    }

    let mut histogram = [0u32; 256];
    for &b in src {
        histogram[usize::from(b)] += 1;
    }

    let freqs = normalize_frequencies(&histogram, TOTAL_FREQ);
    let cumulative_freqs = build_cumulative_frequencies(&freqs);

    write_frequencies(&mut dst, &freqs)?;

    let mut states = [LOWER_BOUND; STATE_COUNT];
    // Renormalization output in reverse stream order.
    let mut rev = Vec::new();

    let put = |state: &mut u32, rev: &mut Vec<u8>, sym: u8| {
        put_symbol(
            state,
            rev,
            cumulative_freqs[usize::from(sym)],
            freqs[usize::from(sym)],
        );
    };

    // The 1-3 byte tail is encoded first so it decodes last.
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

    // Context histogram: each state's segment starts from context 0; state 3
    // also carries the tail past the last full quarter.
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

    for i in 0..256 {
        if histograms[i].iter().all(|&f| f == 0) {
            continue;
        }

        freqs[i] = normalize_frequencies(&histograms[i], TOTAL_FREQ);
        cumulative_freqs[i] = build_cumulative_frequencies(&freqs[i]);
    }

    write_context_tables(&mut dst, &histograms, &freqs)?;

    let mut states = [LOWER_BOUND; STATE_COUNT];
    let mut rev = Vec::new();

    let put = |state: &mut u32, rev: &mut Vec<u8>, context: u8, sym: u8| {
        put_symbol(
            state,
            rev,
            cumulative_freqs[usize::from(context)][usize::from(sym)],
            freqs[usize::from(context)][usize::from(sym)],
        );
    };

    // Encode (context, symbol) pairs back to front. State 3 takes the tail
    // beyond the last full quarter first.
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

    // Quarter-first symbols, encoded with context 0.
    put(&mut states[3], &mut rev, 0, src[3 * quarter]);
    put(&mut states[2], &mut rev, 0, src[2 * quarter]);
    put(&mut states[1], &mut rev, 0, src[quarter]);
    put(&mut states[0], &mut rev, 0, src[0]);

    flush_states(&states, &mut rev);

    rev.reverse();
    dst.extend_from_slice(&rev);

    Ok(dst)
}

fn write_context_tables(
    dst: &mut Vec<u8>,
    histograms: &[[u32; 256]],
    freqs: &[[u32; 256]],
) -> io::Result<()> {
    let present: Vec<bool> = histograms
        .iter()
        .map(|h| h.iter().any(|&f| f > 0))
        .collect();

    let mut rle = 0;

    for i in 0..256 {
        if !present[i] {
            continue;
        }

        if rle > 0 {
            rle -= 1;
        } else {
            dst.push(i as u8);

            if i > 0 && present[i - 1] {
                let mut run = 0;
                while i + 1 + run < 256 && present[i + 1 + run] {
                    run += 1;
                }

                dst.push(run as u8);
                rle = run;
            }
        }

        write_frequencies(dst, &freqs[i])?;
    }

    dst.push(0);

    Ok(())
}

fn put_symbol(state: &mut u32, rev: &mut Vec<u8>, start: u32, freq: u32) {
    let x_max = ((LOWER_BOUND >> TOTAL_FREQ_SHIFT) << 8) * freq;

    let mut x = *state;
    while x >= x_max {
        rev.push(x as u8);
        x >>= 8;
    }

    *state = ((x / freq) << TOTAL_FREQ_SHIFT) + (x % freq) + start;
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
