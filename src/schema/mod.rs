//! Pattern description and schema compilation.
//!
//! A pattern is authored as declarative data (`FieldSpec` / `PatternSpec`),
//! then compiled once into an immutable [`Schema`] that the encode/decode
//! engines traverse. Templates are inflated and index targets resolved at
//! compile time; nothing mutates afterwards.

mod compile;
mod spec;
mod template;

pub use compile::Schema;
pub use spec::{FieldSpec, PatternSpec};

pub(crate) use compile::{FieldIdx, FieldKind, FieldNode, IndexArm};
