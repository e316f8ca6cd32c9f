use std::{collections::HashMap, io};

use super::{DUP_STREAM, NEW_POSITION, NUL, Type};
use crate::{
    codecs::rans_nx16,
    io::reader::num::{read_u8, read_u32_le, read_uint7_as},
};

/// Decodes a tok3 stream back into NUL-terminated names.
pub fn decode(mut src: &[u8]) -> io::Result<Vec<u8>> {
    let src = &mut src;

    let ulen = read_u32_le(src).map(|n| n as usize)?;
    let name_count = read_u32_le(src).map(|n| n as usize)?;

    let use_arith = read_u8(src)?;
    if use_arith != 0 {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "arithmetic-coded token streams are not supported",
        ));
    }

    let positions = read_token_streams(src)?;

    let mut readers: Vec<TokenReader<'_>> = positions.iter().map(TokenReader::new).collect();

    let mut names: Vec<Vec<u8>> = Vec::with_capacity(name_count);
    let mut tokens: Vec<Vec<TokenValue>> = Vec::with_capacity(name_count);

    for i in 0..name_count {
        let (name, name_tokens) = decode_name(&mut readers, &names, &tokens, i)?;
        names.push(name);
        tokens.push(name_tokens);
    }

    let mut dst = Vec::with_capacity(ulen);

    for name in &names {
        dst.extend_from_slice(name);
        dst.push(NUL);
    }

    if dst.len() < ulen {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "name stream size mismatch",
        ));
    }

    dst.truncate(ulen);

    Ok(dst)
}

/// A decoded token: the raw text plus its numeric value when the token is a
/// digit form that later names may delta against.
#[derive(Clone, Debug)]
struct TokenValue {
    raw: Vec<u8>,
    value: Option<u32>,
}

fn decode_name(
    readers: &mut [TokenReader<'_>],
    names: &[Vec<u8>],
    tokens: &[Vec<TokenValue>],
    i: usize,
) -> io::Result<(Vec<u8>, Vec<TokenValue>)> {
    let [mode_reader, token_readers @ ..] = readers else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing token mode stream",
        ));
    };

    let prev = match mode_reader.read_type()? {
        Type::Dup => {
            let delta = mode_reader.read_u32(Type::Dup)? as usize;
            let j = i
                .checked_sub(delta)
                .ok_or_else(|| invalid_reference(i, delta))?;

            return Ok((names[j].clone(), tokens[j].clone()));
        }
        Type::Diff => {
            let delta = mode_reader.read_u32(Type::Diff)? as usize;

            if i == 0 {
                // The very first name diffs against nothing.
                if delta != 0 {
                    return Err(invalid_reference(i, delta));
                }

                None
            } else if delta == 0 || delta > i {
                return Err(invalid_reference(i, delta));
            } else {
                Some(i - delta)
            }
        }
        ty => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid name mode: {ty:?}"),
            ));
        }
    };

    let prev_tokens = prev.map(|j| tokens[j].as_slice()).unwrap_or_default();

    let mut name = Vec::new();
    let mut name_tokens = Vec::new();

    for t in 0.. {
        let Some(reader) = token_readers.get_mut(t) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unterminated name token list",
            ));
        };

        let token = match reader.read_type()? {
            Type::End => break,
            Type::Match => prev_token(prev_tokens, t)?.clone(),
            Type::String => {
                let raw = reader.read_string()?;
                TokenValue { raw, value: None }
            }
            Type::Char => {
                let b = reader.read_u8(Type::Char)?;
                TokenValue {
                    raw: vec![b],
                    value: None,
                }
            }
            Type::Digits => {
                let value = reader.read_u32(Type::Digits)?;
                TokenValue {
                    raw: value.to_string().into_bytes(),
                    value: Some(value),
                }
            }
            Type::Digits0 => {
                let value = reader.read_u32(Type::Digits0)?;
                let width = usize::from(reader.read_u8(Type::DZLen)?);
                TokenValue {
                    raw: format_padded(value, width),
                    value: Some(value),
                }
            }
            Type::Delta => {
                let delta = reader.read_u8(Type::Delta)?;
                let prev_value = prev_numeric(prev_tokens, t)?;
                let value = prev_value.wrapping_add(u32::from(delta));
                TokenValue {
                    raw: value.to_string().into_bytes(),
                    value: Some(value),
                }
            }
            Type::Delta0 => {
                let delta = reader.read_u8(Type::Delta0)?;
                let prev_token = prev_token(prev_tokens, t)?;
                let prev_value = prev_token.value.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "delta against non-numeric token")
                })?;
                let width = prev_token.raw.len();
                let value = prev_value.wrapping_add(u32::from(delta));
                TokenValue {
                    raw: format_padded(value, width),
                    value: Some(value),
                }
            }
            ty => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid token type: {ty:?}"),
                ));
            }
        };

        name.extend_from_slice(&token.raw);
        name_tokens.push(token);
    }

    Ok((name, name_tokens))
}

fn prev_token<'a>(prev_tokens: &'a [TokenValue], t: usize) -> io::Result<&'a TokenValue> {
    prev_tokens.get(t).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "token reference past the end of the previous name",
        )
    })
}

fn prev_numeric(prev_tokens: &[TokenValue], t: usize) -> io::Result<u32> {
    prev_token(prev_tokens, t)?.value.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "delta against non-numeric token")
    })
}

fn format_padded(value: u32, width: usize) -> Vec<u8> {
    let mut s = value.to_string();

    while s.len() < width {
        s.insert(0, '0');
    }

    s.into_bytes()
}

fn invalid_reference(i: usize, delta: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("invalid name reference: {i} - {delta}"),
    )
}

type TokenStreams = Vec<HashMap<Type, Vec<u8>>>;

fn read_token_streams(src: &mut &[u8]) -> io::Result<TokenStreams> {
    let mut positions: TokenStreams = Vec::new();

    while !src.is_empty() {
        let b = read_u8(src)?;

        let is_new_position = b & NEW_POSITION != 0;
        let is_dup = b & DUP_STREAM != 0;
        let ty = Type::try_from(b & !(NEW_POSITION | DUP_STREAM))?;

        if is_new_position {
            positions.push(HashMap::new());
        }

        let data = if is_dup {
            let dup_position = usize::from(read_u8(src)?);
            let dup_type = Type::try_from(read_u8(src)?)?;

            positions
                .get(dup_position)
                .and_then(|streams| streams.get(&dup_type))
                .cloned()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        "duplicate stream reference to a missing stream",
                    )
                })?
        } else {
            let compressed_len: usize = read_uint7_as(src)?;

            let mut buf = src
                .split_off(..compressed_len)
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

            rans_nx16::decode(&mut buf, None)?
        };

        let streams = positions.last_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "token stream before the first position marker",
            )
        })?;

        streams.insert(ty, data);
    }

    Ok(positions)
}

struct TokenReader<'a> {
    streams: &'a HashMap<Type, Vec<u8>>,
    cursors: HashMap<Type, usize>,
}

impl<'a> TokenReader<'a> {
    fn new(streams: &'a HashMap<Type, Vec<u8>>) -> Self {
        Self {
            streams,
            cursors: HashMap::new(),
        }
    }

    fn remaining(&mut self, ty: Type) -> io::Result<(&'a [u8], &mut usize)> {
        let data = self
            .streams
            .get(&ty)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("missing {ty:?} stream"))
            })?
            .as_slice();

        let pos = self.cursors.entry(ty).or_insert(0);

        Ok((data, pos))
    }

    fn read_type(&mut self) -> io::Result<Type> {
        self.read_u8(Type::Type).and_then(Type::try_from)
    }

    fn read_u8(&mut self, ty: Type) -> io::Result<u8> {
        let (data, pos) = self.remaining(ty)?;

        let b = data
            .get(*pos)
            .copied()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        *pos += 1;

        Ok(b)
    }

    fn read_u32(&mut self, ty: Type) -> io::Result<u32> {
        let (data, pos) = self.remaining(ty)?;

        let buf = data
            .get(*pos..*pos + 4)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        *pos += 4;

        Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    fn read_string(&mut self) -> io::Result<Vec<u8>> {
        let (data, pos) = self.remaining(Type::String)?;

        let rest = &data[*pos..];
        let end = memchr::memchr(NUL, rest)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        *pos += end + 1;

        Ok(rest[..end].to_vec())
    }
}
