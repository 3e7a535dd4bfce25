//! Deterministic generators for sorted grouping inputs.
//!
//! Everything takes a caller-seeded [`SmallRng`] so failures reproduce
//! from the seed printed by the test.

use rand::Rng;
use rand::rngs::SmallRng;
use riffle_types::{Tuple, Value};

/// Ascending unique integer keys, each with `0..=max_values` payload rows
/// of the shape `[key, seq]`. Ready to feed an in-memory sorted stream.
pub fn keyed_runs(
    rng: &mut SmallRng,
    keys: usize,
    max_values: usize,
) -> Vec<(Tuple, Vec<Tuple>)> {
    let mut key = 0i64;
    let mut out = Vec::with_capacity(keys);
    for _ in 0..keys {
        key += rng.random_range(1..=3);
        let rows = rng.random_range(0..=max_values);
        let values = (0..rows as i64)
            .map(|seq| Tuple::new(vec![Value::Int(key), Value::Int(seq)]))
            .collect();
        out.push((Tuple::new(vec![Value::Int(key)]), values));
    }
    out
}

/// Composite physical keys `[group, sort]`, ascending in that order, one
/// payload row per key. `fanout` bounds the sort keys per group; every
/// group gets at least one.
pub fn composite_runs(
    rng: &mut SmallRng,
    groups: usize,
    fanout: usize,
) -> Vec<(Tuple, Vec<Tuple>)> {
    let mut group = 0i64;
    let mut out = Vec::new();
    for _ in 0..groups {
        group += rng.random_range(1..=2);
        let sorts = rng.random_range(1..=fanout) as i64;
        for sort in 0..sorts {
            let key = Tuple::new(vec![Value::Int(group), Value::Int(sort)]);
            let row = Tuple::new(vec![Value::Int(group), Value::Int(sort), Value::Int(0)]);
            out.push((key, vec![row]));
        }
    }
    out
}
