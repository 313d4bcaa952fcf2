use thiserror::Error;

/// Broad classification of a codec failure.
///
/// Callers that use the codec as a light pattern-matcher ("does this buffer
/// match this field?") can branch on the kind instead of individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema construction or field/template resolution failure.
    Schema,
    /// A buffer or declared capacity is too short for a field.
    Length,
    /// Decoded bytes differ from a fixed literal, or a discriminant matched
    /// no registered index item.
    Mismatch,
    /// The supplied value has the wrong shape for the field.
    Type,
    /// Unsupported format tag, or bytes the primitive codec cannot interpret.
    Format,
}

/// Codec error type.
///
/// Every failure is immediate and non-recoverable at the point raised; the
/// engines propagate upward without partial results.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No field is registered under the requested identifier.
    #[error("no field registered under id '{0}'")]
    UnknownField(String),
    /// A field references a template that is not registered.
    #[error("template not found: '{0}'")]
    TemplateNotFound(String),
    /// Two fields share one identifier.
    #[error("duplicate field id '{0}'")]
    DuplicateField(String),
    /// Two fields register under one template name.
    #[error("duplicate template name '{0}'")]
    DuplicateTemplate(String),
    /// Structurally invalid pattern (missing attributes, bad child lists,
    /// length-sum violations, template cycles).
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// A caller-supplied length or the remaining buffer is shorter than the
    /// field requires.
    #[error("length too short for field: need {needed} bytes, have {available}")]
    LengthTooShort { needed: usize, available: usize },
    /// An array payload would exceed its declared capacity while encoding.
    #[error("array payload of {payload} bytes exceeds declared capacity of {capacity}")]
    ArrayOverflow { payload: usize, capacity: usize },

    /// Decoded bytes differ from a fixed field's literal.
    #[error("value mismatch for fixed field: expected {expected}, decoded {actual}")]
    FixedMismatch { expected: String, actual: String },
    /// A discriminant matched no registered index item.
    #[error("discriminant {0} not found in index")]
    UnmatchedDiscriminant(String),

    /// A value has the wrong shape for the field consuming it.
    #[error("type error: {0}")]
    UnexpectedType(String),

    /// An unknown format tag reached the primitive codec.
    #[error("unsupported format: '{0}'")]
    UnsupportedFormat(String),
    /// Bytes the primitive codec cannot interpret (invalid BCD digit,
    /// non-UTF-8 string payload).
    #[error("invalid field data: {0}")]
    InvalidData(String),
}

impl CodecError {
    /// Classify this error into one of the five broad kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnknownField(_)
            | CodecError::TemplateNotFound(_)
            | CodecError::DuplicateField(_)
            | CodecError::DuplicateTemplate(_)
            | CodecError::InvalidPattern(_) => ErrorKind::Schema,
            CodecError::LengthTooShort { .. } | CodecError::ArrayOverflow { .. } => {
                ErrorKind::Length
            }
            CodecError::FixedMismatch { .. } | CodecError::UnmatchedDiscriminant(_) => {
                ErrorKind::Mismatch
            }
            CodecError::UnexpectedType(_) => ErrorKind::Type,
            CodecError::UnsupportedFormat(_) | CodecError::InvalidData(_) => ErrorKind::Format,
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_variants() {
        assert_eq!(
            CodecError::UnknownField("battery".into()).kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            CodecError::LengthTooShort {
                needed: 4,
                available: 2
            }
            .kind(),
            ErrorKind::Length
        );
        assert_eq!(
            CodecError::UnmatchedDiscriminant("9".into()).kind(),
            ErrorKind::Mismatch
        );
        assert_eq!(
            CodecError::UnexpectedType("not a sequence".into()).kind(),
            ErrorKind::Type
        );
        assert_eq!(
            CodecError::UnsupportedFormat("int.me".into()).kind(),
            ErrorKind::Format
        );
    }

    #[test]
    fn display_carries_context() {
        let err = CodecError::FixedMismatch {
            expected: "2".into(),
            actual: "3".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("decoded 3"));
    }
}
