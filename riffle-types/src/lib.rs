//! Core data model for the riffle merge-grouping engine.
//!
//! Everything the engine moves around is a [`Tuple`]: an ordered sequence
//! of typed [`Value`] fields with value semantics (field-wise equality,
//! hashing, and a total order). Tuples serve both as group keys and as
//! value payloads.
//!
//! The crate also defines the two pluggable seams the engine consumes:
//!
//! - [`KeyComparator`]: how group keys are ordered. [`NaturalKeyOrder`] is
//!   the field-wise total order; callers supply their own for collations
//!   the natural order cannot express.
//! - [`TupleCodec`]: byte-exact serialization of one tuple onto a spill
//!   segment's stream. [`OrderedTupleCodec`] is the standard
//!   implementation: self-delimiting and memcomparable, so encoded bytes
//!   compare the same way the tuples do.

#![forbid(unsafe_code)]

pub mod codec;
pub mod compare;
pub mod tuple;
pub mod value;

pub use codec::{OrderedTupleCodec, TupleCodec};
pub use compare::{KeyComparator, NaturalKeyOrder};
pub use tuple::Tuple;
pub use value::Value;
