use std::{collections::HashMap, io};

use super::{DUP_STREAM, NEW_POSITION, NUL, Type};
use crate::{
    codecs::rans_nx16,
    io::writer::num::{write_u8, write_u32_le, write_uint7},
};

/// Encodes NUL-terminated names as a tok3 stream.
pub fn encode(src: &[u8]) -> io::Result<Vec<u8>> {
    let stripped = src.strip_suffix(&[NUL]).unwrap_or(src);

    let names: Vec<&[u8]> = if stripped.is_empty() && src.is_empty() {
        Vec::new()
    } else {
        stripped.split(|&b| b == NUL).collect()
    };

    let mut name_indices: HashMap<&[u8], usize> = HashMap::new();
    let mut encoded_names = Vec::with_capacity(names.len());
    let mut max_token_count = 0;

    for (i, name) in names.iter().enumerate() {
        let encoded = if let Some(&j) = name_indices.get(name) {
            EncodedName {
                mode: Mode::Dup(i - j),
                tokens: Vec::new(),
            }
        } else {
            let prev = if i == 0 {
                None
            } else {
                Some(&encoded_names[i - 1])
            };

            build_diff(name, prev)
        };

        name_indices.entry(name).or_insert(i);
        max_token_count = max_token_count.max(encoded.tokens.len());
        encoded_names.push(encoded);
    }

    // One stream set for the mode, then one per token position.
    let mut stream_sets = vec![StreamSet::default(); max_token_count + 1];

    for encoded in &encoded_names {
        match encoded.mode {
            Mode::Dup(delta) => {
                stream_sets[0].push_type(Type::Dup);
                write_u32_le(&mut stream_sets[0].dup, delta as u32)?;
            }
            Mode::Diff(delta) => {
                stream_sets[0].push_type(Type::Diff);
                write_u32_le(&mut stream_sets[0].diff, delta as u32)?;
            }
        }

        if matches!(encoded.mode, Mode::Dup(_)) {
            continue;
        }

        for (t, token) in encoded.tokens.iter().enumerate() {
            stream_sets[t + 1].write_token(token)?;
        }
    }

    let mut dst = Vec::new();

    let ulen =
        u32::try_from(src.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_u32_le(&mut dst, ulen)?;

    let name_count =
        u32::try_from(names.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_u32_le(&mut dst, name_count)?;

    // use_arith = 0: streams are rANS coded.
    write_u8(&mut dst, 0)?;

    let mut written: Vec<(usize, Type, &[u8])> = Vec::new();

    for (position, set) in stream_sets.iter().enumerate() {
        let mut first_in_position = true;

        for (ty, buf) in set.streams() {
            if buf.is_empty() {
                continue;
            }

            let type_byte = if first_in_position {
                NEW_POSITION
            } else {
                u8::from(ty)
            };
            first_in_position = false;

            // Identical streams at earlier positions are stored once and
            // referenced.
            if let Some(&(dup_position, dup_type, _)) =
                written.iter().find(|(_, _, data)| *data == buf)
            {
                write_u8(&mut dst, type_byte | DUP_STREAM)?;
                write_u8(&mut dst, dup_position as u8)?;
                write_u8(&mut dst, u8::from(dup_type))?;
            } else {
                write_u8(&mut dst, type_byte)?;

                let compressed = rans_nx16::encode(rans_nx16::Flags::empty(), buf)?;
                write_uint7(&mut dst, compressed.len() as u32)?;
                dst.extend_from_slice(&compressed);

                if position <= usize::from(u8::MAX) {
                    written.push((position, ty, buf));
                }
            }
        }
    }

    Ok(dst)
}

enum Mode {
    Diff(usize),
    Dup(usize),
}

enum Token {
    String(Vec<u8>),
    Char(u8),
    Digits(u32),
    PaddedDigits(u32, usize),
    Delta(u32, u8),
    PaddedDelta(u32, u8),
    Match,
    End,
}

impl Token {
    fn raw(&self, prev: Option<&EncodedName>, t: usize) -> Vec<u8> {
        match self {
            Self::String(s) => s.clone(),
            Self::Char(b) => vec![*b],
            Self::Digits(n) | Self::Delta(n, _) => n.to_string().into_bytes(),
            Self::PaddedDigits(n, width) => padded(*n, *width),
            Self::PaddedDelta(n, _) => {
                let width = prev
                    .and_then(|p| p.raw_token(t))
                    .map(|s| s.len())
                    .unwrap_or_default();
                padded(*n, width)
            }
            Self::Match => prev
                .and_then(|p| p.raw_token(t))
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            Self::End => Vec::new(),
        }
    }

    fn numeric_value(&self) -> Option<u32> {
        match self {
            Self::Digits(n)
            | Self::PaddedDigits(n, _)
            | Self::Delta(n, _)
            | Self::PaddedDelta(n, _) => Some(*n),
            _ => None,
        }
    }
}

struct EncodedName {
    mode: Mode,
    // (raw token text, token)
    tokens: Vec<(Vec<u8>, Token)>,
}

impl EncodedName {
    fn raw_token(&self, t: usize) -> Option<&[u8]> {
        self.tokens.get(t).map(|(raw, _)| raw.as_slice())
    }

    fn token(&self, t: usize) -> Option<&Token> {
        self.tokens.get(t).map(|(_, token)| token)
    }
}

fn padded(n: u32, width: usize) -> Vec<u8> {
    let mut s = n.to_string();

    while s.len() < width {
        s.insert(0, '0');
    }

    s.into_bytes()
}

/// Splits a name into runs of alphanumeric and non-alphanumeric bytes.
fn tokenize(name: &[u8]) -> Vec<&[u8]> {
    let mut tokens = Vec::new();
    let mut start = 0;

    while start < name.len() {
        let is_alnum = name[start].is_ascii_alphanumeric();

        let mut end = start + 1;
        while end < name.len() && name[end].is_ascii_alphanumeric() == is_alnum {
            end += 1;
        }

        tokens.push(&name[start..end]);
        start = end;
    }

    tokens
}

fn parse_digits(s: &[u8]) -> Option<u32> {
    if s.is_empty() || !s.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let mut n: u32 = 0;

    for &b in s {
        n = n.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }

    Some(n)
}

fn has_leading_zero(s: &[u8]) -> bool {
    s.len() > 1 && s[0] == b'0'
}

fn build_diff(name: &[u8], prev: Option<&EncodedName>) -> EncodedName {
    let mode = match prev {
        Some(_) => Mode::Diff(1),
        None => Mode::Diff(0),
    };

    let mut encoded = EncodedName {
        mode,
        tokens: Vec::new(),
    };

    for (t, raw) in tokenize(name).into_iter().enumerate() {
        let token = diff_token(raw, prev, t).unwrap_or_else(|| literal_token(raw));
        encoded.tokens.push((raw.to_vec(), token));
    }

    encoded.tokens.push((Vec::new(), Token::End));

    encoded
}

fn diff_token(raw: &[u8], prev: Option<&EncodedName>, t: usize) -> Option<Token> {
    let prev = prev?;
    let prev_raw = prev.raw_token(t)?;
    let prev_token = prev.token(t)?;

    if raw == prev_raw {
        return Some(Token::Match);
    }

    let n = prev_token.numeric_value()?;
    let m = parse_digits(raw)?;
    let delta = m.checked_sub(n).and_then(|d| u8::try_from(d).ok())?;

    match prev_token {
        Token::Digits(_) | Token::Delta(..) if !has_leading_zero(raw) => {
            Some(Token::Delta(m, delta))
        }
        Token::PaddedDigits(..) | Token::PaddedDelta(..) if raw.len() == prev_raw.len() => {
            Some(Token::PaddedDelta(m, delta))
        }
        _ => None,
    }
}

fn literal_token(raw: &[u8]) -> Token {
    if has_leading_zero(raw) {
        if let Some(n) = parse_digits(raw) {
            return Token::PaddedDigits(n, raw.len());
        }
    } else if let Some(n) = parse_digits(raw) {
        return Token::Digits(n);
    }

    if let [b] = raw {
        Token::Char(*b)
    } else {
        Token::String(raw.to_vec())
    }
}

#[derive(Clone, Default)]
struct StreamSet {
    types: Vec<u8>,
    string: Vec<u8>,
    char_: Vec<u8>,
    digits0: Vec<u8>,
    dz_len: Vec<u8>,
    dup: Vec<u8>,
    diff: Vec<u8>,
    digits: Vec<u8>,
    delta: Vec<u8>,
    delta0: Vec<u8>,
}

impl StreamSet {
    fn push_type(&mut self, ty: Type) {
        self.types.push(u8::from(ty));
    }

    fn write_token(&mut self, (_, token): &(Vec<u8>, Token)) -> io::Result<()> {
        match token {
            Token::String(s) => {
                self.push_type(Type::String);
                self.string.extend_from_slice(s);
                self.string.push(NUL);
            }
            Token::Char(b) => {
                self.push_type(Type::Char);
                self.char_.push(*b);
            }
            Token::Digits(n) => {
                self.push_type(Type::Digits);
                write_u32_le(&mut self.digits, *n)?;
            }
            Token::PaddedDigits(n, width) => {
                self.push_type(Type::Digits0);
                write_u32_le(&mut self.digits0, *n)?;

                let width = u8::try_from(*width)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                self.dz_len.push(width);
            }
            Token::Delta(_, delta) => {
                self.push_type(Type::Delta);
                self.delta.push(*delta);
            }
            Token::PaddedDelta(_, delta) => {
                self.push_type(Type::Delta0);
                self.delta0.push(*delta);
            }
            Token::Match => self.push_type(Type::Match),
            Token::End => self.push_type(Type::End),
        }

        Ok(())
    }

    fn streams(&self) -> [(Type, &[u8]); 10] {
        [
            (Type::Type, self.types.as_slice()),
            (Type::String, self.string.as_slice()),
            (Type::Char, self.char_.as_slice()),
            (Type::Digits0, self.digits0.as_slice()),
            (Type::DZLen, self.dz_len.as_slice()),
            (Type::Dup, self.dup.as_slice()),
            (Type::Diff, self.diff.as_slice()),
            (Type::Digits, self.digits.as_slice()),
            (Type::Delta, self.delta.as_slice()),
            (Type::Delta0, self.delta0.as_slice()),
        ]
    }
}
