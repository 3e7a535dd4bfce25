use std::cmp::Ordering;
use std::fmt;

use crate::value::Value;

/// An ordered sequence of typed fields.
///
/// Tuples are the unit the engine moves: group keys and value payloads are
/// both tuples. Equality, hashing, and ordering are field-wise; when two
/// tuples of different arity share a prefix, the shorter one sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tuple {
    fields: Vec<Value>,
}

impl Tuple {
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn push(&mut self, value: Value) {
        self.fields.push(value);
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    /// Copy of the first `width` fields. Used to unwrap the grouping
    /// component out of a composite `(group, sort)` key; the copy is what
    /// makes a retained key immune to later reads rewriting the composite.
    pub fn prefix(&self, width: usize) -> Tuple {
        Tuple::new(self.fields.iter().take(width).cloned().collect())
    }

    /// Copy of the fields from `from` onward; the sort-field counterpart
    /// to [`Tuple::prefix`].
    pub fn suffix(&self, from: usize) -> Tuple {
        Tuple::new(self.fields.iter().skip(from).cloned().collect())
    }

    /// Compare only the first `width` fields of both tuples.
    pub fn compare_prefix(&self, other: &Tuple, width: usize) -> Ordering {
        self.fields
            .iter()
            .take(width)
            .cmp(other.fields.iter().take(width))
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(fields: Vec<Value>) -> Self {
        Tuple::new(fields)
    }
}

impl FromIterator<Value> for Tuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Tuple::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "]")
    }
}

/// Build a [`Tuple`] from a list of values convertible into [`Value`].
///
/// ```
/// use riffle_types::{tuple, Value};
///
/// let t = tuple![1, "a", 2.5];
/// assert_eq!(t.get(1), Some(&Value::Str("a".into())));
/// ```
#[macro_export]
macro_rules! tuple {
    () => { $crate::Tuple::default() };
    ($($v:expr),+ $(,)?) => {
        $crate::Tuple::new(vec![$($crate::Value::from($v)),+])
    };
}
