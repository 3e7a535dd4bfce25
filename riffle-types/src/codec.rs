//! Order-preserving binary layout for [`Tuple`] values.
//!
//! Encoded tuples compare as raw byte strings in exactly the order
//! [`Tuple`]'s `Ord` defines, so spill segments can be merged or binary
//! searched without decoding. The layout is tag-prefixed per field:
//!
//! ```text
//! tuple  := field* 0x00
//! field  := 0x01                      null
//!         | 0x02 byte                 bool (0x00 false, 0x01 true)
//!         | 0x03 u64-be               i64, sign bit flipped
//!         | 0x04 u64-be               f64, IEEE-754 total-order bits
//!         | 0x05 esc-bytes 0x00 0x00  utf-8 string
//!         | 0x06 esc-bytes 0x00 0x00  raw bytes
//! ```
//!
//! Variable-width payloads escape interior zero bytes as `0x00 0xFF` and
//! close with a `0x00 0x00` terminator, so a payload that is a strict
//! prefix of another still sorts first. The tuple terminator `0x00` sorts
//! below every field tag, which extends the same prefix rule to tuples of
//! different arity.

use std::io::{self, Read, Write};

use riffle_result::{Error, Result};

use crate::tuple::Tuple;
use crate::value::Value;

const TUPLE_END: u8 = 0x00;
const TAG_NULL: u8 = 0x01;
const TAG_BOOL: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STR: u8 = 0x05;
const TAG_BYTES: u8 = 0x06;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const PAYLOAD_END: u8 = 0x00;

/// Serializes tuples for spill segments.
///
/// Object safe so a store can hold whichever codec its config resolved at
/// run time. Implementations must be self-delimiting: `read` consumes
/// exactly the bytes one `write` produced.
pub trait TupleCodec: Send + Sync {
    /// Appends one encoded tuple to `w`.
    fn write(&self, w: &mut dyn Write, tuple: &Tuple) -> Result<()>;

    /// Decodes one tuple from `r`, consuming exactly its encoding.
    fn read(&self, r: &mut dyn Read) -> Result<Tuple>;

    /// Encodes `tuple` into a fresh buffer.
    fn write_to_vec(&self, tuple: &Tuple) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf, tuple)?;
        Ok(buf)
    }
}

/// The order-preserving codec described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedTupleCodec;

impl TupleCodec for OrderedTupleCodec {
    fn write(&self, w: &mut dyn Write, tuple: &Tuple) -> Result<()> {
        for value in tuple.fields() {
            write_value(w, value)?;
        }
        w.write_all(&[TUPLE_END])?;
        Ok(())
    }

    fn read(&self, r: &mut dyn Read) -> Result<Tuple> {
        let mut fields = Vec::new();
        loop {
            match read_u8(r)? {
                TUPLE_END => return Ok(Tuple::new(fields)),
                TAG_NULL => fields.push(Value::Null),
                TAG_BOOL => {
                    let b = match read_u8(r)? {
                        0x00 => false,
                        0x01 => true,
                        other => {
                            return Err(Error::codec(
                                0,
                                format!("invalid bool byte 0x{other:02x}"),
                            ));
                        }
                    };
                    fields.push(Value::Bool(b));
                }
                TAG_INT => {
                    fields.push(Value::Int((read_u64_be(r)? ^ (1 << 63)) as i64));
                }
                TAG_FLOAT => {
                    fields.push(Value::Float(f64_from_order_bits(read_u64_be(r)?)));
                }
                TAG_STR => {
                    let raw = read_escaped(r)?;
                    let s = String::from_utf8(raw).map_err(|e| {
                        Error::codec(0, format!("string field is not utf-8: {e}"))
                    })?;
                    fields.push(Value::Str(s));
                }
                TAG_BYTES => fields.push(Value::Bytes(read_escaped(r)?)),
                other => {
                    return Err(Error::codec(0, format!("unknown field tag 0x{other:02x}")));
                }
            }
        }
    }
}

fn write_value(w: &mut dyn Write, value: &Value) -> Result<()> {
    match value {
        Value::Null => w.write_all(&[TAG_NULL])?,
        Value::Bool(b) => w.write_all(&[TAG_BOOL, *b as u8])?,
        Value::Int(v) => {
            w.write_all(&[TAG_INT])?;
            w.write_all(&((*v as u64) ^ (1 << 63)).to_be_bytes())?;
        }
        Value::Float(f) => {
            w.write_all(&[TAG_FLOAT])?;
            w.write_all(&f64_to_order_bits(*f).to_be_bytes())?;
        }
        Value::Str(s) => {
            w.write_all(&[TAG_STR])?;
            write_escaped(w, s.as_bytes())?;
        }
        Value::Bytes(b) => {
            w.write_all(&[TAG_BYTES])?;
            write_escaped(w, b)?;
        }
    }
    Ok(())
}

fn write_escaped(w: &mut dyn Write, payload: &[u8]) -> Result<()> {
    let mut first = true;
    for run in payload.split(|&b| b == 0x00) {
        if !first {
            w.write_all(&[ESCAPE, ESCAPED_ZERO])?;
        }
        w.write_all(run)?;
        first = false;
    }
    w.write_all(&[ESCAPE, PAYLOAD_END])?;
    Ok(())
}

fn read_escaped(r: &mut dyn Read) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let b = read_u8(r)?;
        if b != ESCAPE {
            out.push(b);
            continue;
        }
        match read_u8(r)? {
            PAYLOAD_END => return Ok(out),
            ESCAPED_ZERO => out.push(0x00),
            other => {
                return Err(Error::codec(0, format!("invalid escape byte 0x{other:02x}")));
            }
        }
    }
}

// Maps every f64 bit pattern onto u64 so that unsigned comparison matches
// `f64::total_cmp`: -NaN < -inf < ... < -0.0 < 0.0 < ... < inf < NaN.
fn f64_to_order_bits(f: f64) -> u64 {
    let bits = f.to_bits();
    if bits & (1 << 63) != 0 { !bits } else { bits | (1 << 63) }
}

fn f64_from_order_bits(enc: u64) -> f64 {
    let bits = if enc & (1 << 63) != 0 { enc ^ (1 << 63) } else { !enc };
    f64::from_bits(bits)
}

fn read_u8(r: &mut dyn Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf)?;
    Ok(buf[0])
}

fn read_u64_be(r: &mut dyn Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

// A stream that ends mid-encoding is corrupt data, not an I/O fault.
fn read_exact(r: &mut dyn Read, buf: &mut [u8]) -> Result<()> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(Error::codec(0, "encoded value is truncated"))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(tuple: &Tuple) -> Tuple {
        let codec = OrderedTupleCodec;
        let buf = codec.write_to_vec(tuple).unwrap();
        let mut cursor = io::Cursor::new(buf);
        let decoded = codec.read(&mut cursor).unwrap();
        assert_eq!(cursor.position(), cursor.get_ref().len() as u64);
        decoded
    }

    #[test]
    fn round_trips_every_variant() {
        let tuple = Tuple::new(vec![
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(i64::MIN),
            Value::Int(-1),
            Value::Int(0),
            Value::Int(i64::MAX),
            Value::Float(-0.0),
            Value::Float(3.5),
            Value::Str("grp\u{0}key".into()),
            Value::Str(String::new()),
            Value::Bytes(vec![0x00, 0xFF, 0x00]),
            Value::Bytes(Vec::new()),
        ]);
        assert_eq!(round_trip(&tuple), tuple);
        assert_eq!(round_trip(&Tuple::new(vec![])), Tuple::new(vec![]));
    }

    #[test]
    fn nan_survives_round_trip() {
        let tuple = Tuple::new(vec![Value::Float(f64::NAN), Value::Float(-f64::NAN)]);
        let back = round_trip(&tuple);
        assert_eq!(back, tuple);
    }

    #[test]
    fn encoded_bytes_sort_like_tuples() {
        let mut tuples = vec![
            Tuple::new(vec![]),
            Tuple::new(vec![Value::Null]),
            Tuple::new(vec![Value::Bool(false)]),
            Tuple::new(vec![Value::Bool(true)]),
            Tuple::new(vec![Value::Int(i64::MIN)]),
            Tuple::new(vec![Value::Int(-7)]),
            Tuple::new(vec![Value::Int(-7), Value::Int(0)]),
            Tuple::new(vec![Value::Int(0)]),
            Tuple::new(vec![Value::Int(1), Value::Int(2)]),
            Tuple::new(vec![Value::Int(2)]),
            Tuple::new(vec![Value::Int(i64::MAX)]),
            Tuple::new(vec![Value::Float(f64::NEG_INFINITY)]),
            Tuple::new(vec![Value::Float(-0.0)]),
            Tuple::new(vec![Value::Float(0.0)]),
            Tuple::new(vec![Value::Float(f64::NAN)]),
            Tuple::new(vec![Value::Str("a".into())]),
            Tuple::new(vec![Value::Str("a\u{0}b".into())]),
            Tuple::new(vec![Value::Str("ab".into())]),
            Tuple::new(vec![Value::Bytes(vec![0x00])]),
            Tuple::new(vec![Value::Bytes(vec![0x01])]),
        ];
        tuples.sort();

        let codec = OrderedTupleCodec;
        let mut encoded: Vec<Vec<u8>> = tuples
            .iter()
            .map(|t| codec.write_to_vec(t).unwrap())
            .collect();
        let by_tuple = encoded.clone();
        encoded.sort();
        assert_eq!(encoded, by_tuple);
    }

    #[test]
    fn truncated_stream_is_a_codec_error() {
        let codec = OrderedTupleCodec;
        let buf = codec
            .write_to_vec(&Tuple::new(vec![Value::Int(42)]))
            .unwrap();
        let mut cursor = io::Cursor::new(&buf[..buf.len() - 3]);
        let err = codec.read(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::Codec { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_tag_is_a_codec_error() {
        let codec = OrderedTupleCodec;
        let mut cursor = io::Cursor::new(vec![0x7Fu8]);
        let err = codec.read(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::Codec { .. }), "got {err:?}");
    }
}
