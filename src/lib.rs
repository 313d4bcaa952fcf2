// Schema-driven binary message codec.
//
// A message "pattern" is a declarative, JSON-compatible description of a
// fixed/variable-length byte layout: scalar leaves, structured combinations,
// repeated sequences, discriminated unions and reusable field templates.
// `Schema::compile` turns a pattern into an immutable compiled schema which
// then encodes structured `Value`s into exact byte sequences and decodes
// byte buffers back, one top-down recursive pass per call.
//
// The crate owns no I/O surface; host applications hand it byte buffers and
// get byte buffers back.

mod codec;
mod error;
mod schema;
mod value;

pub mod hex;

pub use error::{CodecError, CodecResult, ErrorKind};
pub use schema::{FieldSpec, PatternSpec, Schema};
pub use value::Value;
