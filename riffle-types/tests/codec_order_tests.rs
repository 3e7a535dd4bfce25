use std::io::Cursor;

use riffle_types::{OrderedTupleCodec, Tuple, TupleCodec, Value, tuple};

/* --------------------------- Shared helpers ---------------------------- */

/// Encode one tuple into a fresh frame.
#[inline]
fn encode(t: &Tuple) -> Vec<u8> {
    OrderedTupleCodec
        .write_to_vec(t)
        .expect("encoding must succeed")
}

/// Decode one tuple, asserting the frame is fully consumed.
#[inline]
fn decode(frame: &[u8]) -> Tuple {
    let mut cursor = Cursor::new(frame);
    let t = OrderedTupleCodec
        .read(&mut cursor)
        .expect("decoding must succeed");
    assert_eq!(cursor.position() as usize, frame.len());
    t
}

/// Sort `tuples` purely by their encoded byte strings, then decode back.
#[inline]
fn sort_by_encoding(tuples: &[Tuple]) -> Vec<Tuple> {
    let mut frames: Vec<Vec<u8>> = tuples.iter().map(encode).collect();
    frames.sort();
    frames.iter().map(|f| decode(f)).collect()
}

/* ------------------------------ Tests ---------------------------------- */

/// Single-field tuples across every value type, deliberately shuffled.
/// The encoding must collate by type rank first (null < bool < int <
/// float < str < bytes), then by payload within a type.
#[test]
fn test_scalar_order_roundtrip() {
    let shuffled = vec![
        tuple!["zeta"],
        tuple![9],
        tuple![Value::Null],
        tuple![-3.5],
        tuple![Value::Bytes(b"ab".to_vec())],
        tuple![true],
        tuple![-12],
        tuple![false],
        tuple![2.25],
        tuple![Value::Bytes(b"aa".to_vec())],
        tuple!["alpha"],
    ];

    let got = sort_by_encoding(&shuffled);

    let expect = vec![
        tuple![Value::Null],
        tuple![false],
        tuple![true],
        tuple![-12],
        tuple![9],
        tuple![-3.5],
        tuple![2.25],
        tuple!["alpha"],
        tuple!["zeta"],
        tuple![Value::Bytes(b"aa".to_vec())],
        tuple![Value::Bytes(b"ab".to_vec())],
    ];

    assert_eq!(got, expect);
}

/// Strings with interior NULs and shared prefixes. The escape scheme must
/// keep the bytewise lex order of the raw payloads and round-trip them
/// losslessly.
#[test]
fn test_string_escape_order_roundtrip() {
    let shuffled = vec![
        tuple!["ab"],
        tuple!["a\u{0}"],
        tuple![""],
        tuple!["a\u{0}\u{0}"],
        tuple!["a"],
        tuple!["a\u{0}b"],
    ];

    let got = sort_by_encoding(&shuffled);

    // "" < "a" < "a\0" < "a\0\0" < "a\0b" < "ab": every string sorts
    // before its own extensions, and NUL sorts below every other byte.
    let expect = vec![
        tuple![""],
        tuple!["a"],
        tuple!["a\u{0}"],
        tuple!["a\u{0}\u{0}"],
        tuple!["a\u{0}b"],
        tuple!["ab"],
    ];

    assert_eq!(got, expect);
}

/// A tuple sorts before every longer tuple it is a field-prefix of,
/// matching field-wise comparison across arities.
#[test]
fn test_arity_prefix_order() {
    let shuffled = vec![
        tuple![1, "b"],
        tuple![2],
        tuple![1],
        tuple![],
        tuple![1, "a", 0],
        tuple![1, "a"],
    ];

    let got = sort_by_encoding(&shuffled);

    let expect = vec![
        tuple![],
        tuple![1],
        tuple![1, "a"],
        tuple![1, "a", 0],
        tuple![1, "b"],
        tuple![2],
    ];

    assert_eq!(got, expect);
}

/// Floats collate under IEEE-754 total order, negative NaN below
/// everything and positive NaN above, and sign bits survive the trip.
#[test]
fn test_float_total_order_roundtrip() {
    let shuffled = vec![
        tuple![f64::NAN],
        tuple![0.0],
        tuple![f64::NEG_INFINITY],
        tuple![-0.0],
        tuple![-f64::NAN],
        tuple![1.5],
        tuple![f64::INFINITY],
        tuple![-1.5],
    ];

    let got = sort_by_encoding(&shuffled);

    let expect = vec![
        tuple![-f64::NAN],
        tuple![f64::NEG_INFINITY],
        tuple![-1.5],
        tuple![-0.0],
        tuple![0.0],
        tuple![1.5],
        tuple![f64::INFINITY],
        tuple![f64::NAN],
    ];

    assert_eq!(got, expect);

    // -0.0 and 0.0 remain distinct bit patterns after decode.
    let neg_zero = decode(&encode(&tuple![-0.0]));
    match neg_zero.get(0) {
        Some(Value::Float(f)) => assert!(f.is_sign_negative()),
        other => panic!("unexpected field: {other:?}"),
    }
}
