use std::io;

use crate::io::{BitReader, BitWriter};

/// A symbol with its canonical code assignment.
#[derive(Clone, Copy, Debug)]
struct Codeword {
    symbol: i32,
    bit_len: u32,
    code: u32,
}

/// Assigns canonical codes: symbols are ordered by (bit length, symbol),
/// codes count up from 0 within a length, and each length increase shifts
/// the running code left by the length delta.
fn assign_codewords(alphabet: &[i32], bit_lens: &[u32]) -> Vec<Codeword> {
    let mut codewords: Vec<_> = alphabet
        .iter()
        .zip(bit_lens)
        .map(|(&symbol, &bit_len)| Codeword {
            symbol,
            bit_len,
            code: 0,
        })
        .collect();

    codewords.sort_unstable_by_key(|codeword| (codeword.bit_len, codeword.symbol));

    let mut code = 0;
    let mut bit_len = 0;

    for codeword in &mut codewords {
        code <<= codeword.bit_len - bit_len;
        bit_len = codeword.bit_len;

        codeword.code = code;
        code += 1;
    }

    codewords
}

// The codes of one bit length form a consecutive run starting at
// `first_code`, so a candidate code resolves by offset instead of lookup.
#[derive(Clone, Copy, Debug)]
struct LengthGroup {
    bit_len: u32,
    first_code: u32,
    symbol_offset: usize,
    symbol_count: u32,
}

/// A canonical huffman decoder.
#[derive(Clone, Debug)]
pub struct CanonicalHuffmanDecoder {
    // Symbols in code order, partitioned by the length groups.
    symbols: Vec<i32>,
    groups: Vec<LengthGroup>,
}

impl CanonicalHuffmanDecoder {
    pub fn new(alphabet: &[i32], bit_lens: &[u32]) -> Self {
        let mut symbols = Vec::with_capacity(alphabet.len());
        let mut groups: Vec<LengthGroup> = Vec::new();

        for codeword in assign_codewords(alphabet, bit_lens) {
            match groups.last_mut() {
                Some(group) if group.bit_len == codeword.bit_len => group.symbol_count += 1,
                _ => groups.push(LengthGroup {
                    bit_len: codeword.bit_len,
                    first_code: codeword.code,
                    symbol_offset: symbols.len(),
                    symbol_count: 1,
                }),
            }

            symbols.push(codeword.symbol);
        }

        Self { symbols, groups }
    }

    /// Reads one code, widening it group by group until it lands in a
    /// group's code range.
    ///
    /// An empty code table always fails, as does a code that matches no
    /// group.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> io::Result<i32> {
        let mut code = 0;
        let mut bit_len = 0;

        for group in &self.groups {
            code = (code << (group.bit_len - bit_len)) | reader.read_u32(group.bit_len - bit_len)?;
            bit_len = group.bit_len;

            let offset = code.wrapping_sub(group.first_code);

            if offset < group.symbol_count {
                return Ok(self.symbols[group.symbol_offset + offset as usize]);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid huffman code",
        ))
    }
}

/// A canonical huffman encoder sharing the decoder's code assignment.
#[derive(Clone, Debug)]
pub struct CanonicalHuffmanEncoder {
    // Codewords ordered by symbol for binary search.
    codewords: Vec<Codeword>,
}

impl CanonicalHuffmanEncoder {
    pub fn new(alphabet: &[i32], bit_lens: &[u32]) -> Self {
        let mut codewords = assign_codewords(alphabet, bit_lens);
        codewords.sort_unstable_by_key(|codeword| codeword.symbol);
        Self { codewords }
    }

    pub fn encode(&self, writer: &mut BitWriter, value: i32) -> io::Result<()> {
        let codeword = self
            .codewords
            .binary_search_by_key(&value, |codeword| codeword.symbol)
            .map(|i| self.codewords[i])
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("symbol not in the code table: {value}"),
                )
            })?;

        writer.write_u32(codeword.code, codeword.bit_len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_codewords() {
        let symbols = [65, 66, 67, 68, 69, 70];
        let bit_lens = [1, 3, 3, 3, 4, 4];

        let codewords = assign_codewords(&symbols, &bit_lens);

        let actual: Vec<_> = codewords
            .iter()
            .map(|codeword| (codeword.symbol, codeword.code, codeword.bit_len))
            .collect();

        let expected = [
            (65, 0b0, 1),
            (66, 0b100, 3),
            (67, 0b101, 3),
            (68, 0b110, 3),
            (69, 0b1110, 4),
            (70, 0b1111, 4),
        ];

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_decode() -> io::Result<()> {
        let symbols = [0x4e, 0x44, 0x4c];
        let bit_lens = [1, 2, 2];
        let decoder = CanonicalHuffmanDecoder::new(&symbols, &bit_lens);

        let data = [0b01011000];
        let mut reader = BitReader::new(&data[..]);

        assert_eq!(decoder.decode(&mut reader)?, 0x4e);
        assert_eq!(decoder.decode(&mut reader)?, 0x44);
        assert_eq!(decoder.decode(&mut reader)?, 0x4c);
        assert_eq!(decoder.decode(&mut reader)?, 0x4e);

        Ok(())
    }

    #[test]
    fn test_decode_with_empty_code_table() {
        let decoder = CanonicalHuffmanDecoder::new(&[], &[]);

        let data = [0b00000000];
        let mut reader = BitReader::new(&data[..]);

        assert!(matches!(
            decoder.decode(&mut reader),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }

    #[test]
    fn test_encode() -> io::Result<()> {
        let symbols = [0x4e, 0x44, 0x4c];
        let bit_lens = [1, 2, 2];
        let encoder = CanonicalHuffmanEncoder::new(&symbols, &bit_lens);

        let mut writer = BitWriter::default();
        encoder.encode(&mut writer, 0x4e)?;
        encoder.encode(&mut writer, 0x44)?;
        encoder.encode(&mut writer, 0x4c)?;
        encoder.encode(&mut writer, 0x4e)?;

        let data = writer.finish()?;
        assert_eq!(data, [0b01011000]);

        Ok(())
    }

    #[test]
    fn test_encode_with_single_symbol() -> io::Result<()> {
        // A zero-bit-length codeword consumes no output.
        let encoder = CanonicalHuffmanEncoder::new(&[42], &[0]);

        let mut writer = BitWriter::default();
        encoder.encode(&mut writer, 42)?;
        encoder.encode(&mut writer, 42)?;

        let data = writer.finish()?;
        assert!(data.is_empty());

        Ok(())
    }

    #[test]
    fn test_encode_with_unknown_symbol() {
        let encoder = CanonicalHuffmanEncoder::new(&[1, 2], &[1, 1]);

        let mut writer = BitWriter::default();

        assert!(matches!(
            encoder.encode(&mut writer, 3),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }

    #[test]
    fn test_round_trip() -> io::Result<()> {
        let symbols = [65, 66, 67, 68, 69, 70];
        let bit_lens = [1, 3, 3, 3, 4, 4];

        let encoder = CanonicalHuffmanEncoder::new(&symbols, &bit_lens);
        let decoder = CanonicalHuffmanDecoder::new(&symbols, &bit_lens);

        let values = [65, 66, 67, 68, 69, 70, 65, 65];

        let mut writer = BitWriter::default();
        for &value in &values {
            encoder.encode(&mut writer, value)?;
        }
        let data = writer.finish()?;

        let mut reader = BitReader::new(&data);
        for &expected in &values {
            assert_eq!(decoder.decode(&mut reader)?, expected);
        }

        Ok(())
    }

    #[test]
    fn test_canonical_codes_are_ordered_within_a_length() {
        // For two symbols with equal code length, the smaller symbol takes
        // the smaller code.
        let symbols = [9, 3, 7, 1];
        let bit_lens = [2, 2, 2, 2];

        let codewords = assign_codewords(&symbols, &bit_lens);

        for pair in codewords.windows(2) {
            assert!(pair[0].symbol < pair[1].symbol);
            assert!(pair[0].code < pair[1].code);
        }
    }

    #[test]
    fn test_no_code_is_a_prefix_of_a_longer_code() {
        let symbols = [65, 66, 67, 68, 69, 70];
        let bit_lens = [1, 3, 3, 3, 4, 4];

        let codewords = assign_codewords(&symbols, &bit_lens);

        for a in &codewords {
            for b in &codewords {
                if a.bit_len < b.bit_len {
                    assert_ne!(b.code >> (b.bit_len - a.bit_len), a.code);
                }
            }
        }
    }
}
