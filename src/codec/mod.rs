//! The encode/decode engines and the primitive scalar codec.
//!
//! Both engines are single top-down recursive passes over the compiled node
//! arena; no state persists across calls and every failure propagates
//! immediately without partial results.

mod decode;
mod encode;
pub(crate) mod scalar;
