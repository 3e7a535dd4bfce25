use std::cmp::Ordering;

use crate::tuple::Tuple;

/// Total order over group keys.
///
/// One comparator instance is shared by every input of a grouping, so keys
/// from different ordinals collate identically. Implementations must be a
/// total order; the engine never re-checks antisymmetry or transitivity.
pub trait KeyComparator: Send + Sync {
    fn compare(&self, a: &Tuple, b: &Tuple) -> Ordering;
}

/// The field-wise total order defined by [`Tuple`]'s `Ord`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalKeyOrder;

impl KeyComparator for NaturalKeyOrder {
    fn compare(&self, a: &Tuple, b: &Tuple) -> Ordering {
        a.cmp(b)
    }
}

/// Any `Fn(&Tuple, &Tuple) -> Ordering` closure works as a comparator,
/// which keeps one-off collations (reversed, case-folded, ...) out of
/// struct ceremony.
impl<F> KeyComparator for F
where
    F: Fn(&Tuple, &Tuple) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &Tuple, b: &Tuple) -> Ordering {
        self(a, b)
    }
}
