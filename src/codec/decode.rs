use crate::codec::scalar::{self, WireFormat};
use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldIdx, FieldKind, Schema};
use crate::value::Value;
use std::collections::HashMap;

impl Schema {
    /// Decode a byte buffer window into a structured value.
    ///
    /// `offset` is where the field starts inside `buf`; `length`, when
    /// supplied, is the number of bytes the caller grants the field (it must
    /// cover the field's declared width). `field_id` selects a registered
    /// field; `None` uses the pattern's default field.
    pub fn decode(
        &self,
        buf: &[u8],
        offset: usize,
        length: Option<usize>,
        field_id: Option<&str>,
    ) -> CodecResult<Value> {
        let idx = self.resolve_field(field_id)?;
        self.decode_field(buf, offset, length, idx)
    }

    fn decode_field(
        &self,
        buf: &[u8],
        offset: usize,
        length: Option<usize>,
        idx: FieldIdx,
    ) -> CodecResult<Value> {
        let node = self.node(idx);
        if let Some(len) = length {
            if len < node.byte_length {
                return Err(CodecError::LengthTooShort {
                    needed: node.byte_length,
                    available: len,
                });
            }
        }

        let result = match &node.kind {
            FieldKind::Fixed { format, literal } => {
                let scalar = read_scalar(buf, offset, node.byte_length, *format)?;
                if scalar != *literal {
                    return Err(CodecError::FixedMismatch {
                        expected: literal.to_string(),
                        actual: scalar.to_string(),
                    });
                }
                scalar
            }
            FieldKind::Variable { format } => read_scalar(buf, offset, node.byte_length, *format)?,
            FieldKind::Index { format, arms } => {
                let scalar = read_scalar(buf, offset, node.byte_length, *format)?;
                let arm = arms
                    .iter()
                    .find(|arm| arm.discriminant == scalar)
                    .ok_or_else(|| CodecError::UnmatchedDiscriminant(scalar.to_string()))?;
                tracing::trace!(discriminant = %scalar, "index dispatch");
                // The target re-decodes from the same offset under the same
                // bound; the discriminant's width stays included in both.
                return self.decode_field(buf, offset, length, arm.target);
            }
            FieldKind::Combination { children } => {
                let mut object = HashMap::new();
                let mut child_offset = offset;
                for &child in children {
                    let child_width = self.node(child).byte_length;
                    let decoded =
                        self.decode_field(buf, child_offset, Some(child_width), child)?;
                    child_offset += child_width;
                    // Named results and pass-through maps merge; a bare
                    // scalar from an unnamed child has no key and is dropped.
                    if let Value::Map(entries) = decoded {
                        object.extend(entries);
                    }
                }
                Value::Map(object)
            }
            FieldKind::Array { item } => {
                let item_width = self.node(*item).byte_length;
                // Bounded by the declared width when an outer bound
                // constrains this field, otherwise by the remaining buffer.
                let end = match length {
                    Some(_) => offset + node.byte_length,
                    None => buf.len(),
                };
                let mut items = Vec::new();
                let mut item_offset = offset;
                while item_offset + item_width <= end {
                    items.push(self.decode_field(buf, item_offset, Some(item_width), *item)?);
                    item_offset += item_width;
                }
                Value::Seq(items)
            }
        };

        Ok(match &node.name {
            Some(name) => Value::Map(HashMap::from([(name.clone(), result)])),
            None => result,
        })
    }
}

/// Fetch a leaf's byte window and decode it through the primitive codec.
fn read_scalar(
    buf: &[u8],
    offset: usize,
    byte_length: usize,
    format: WireFormat,
) -> CodecResult<Value> {
    let window = buf
        .get(offset..offset + byte_length)
        .ok_or(CodecError::LengthTooShort {
            needed: byte_length,
            available: buf.len().saturating_sub(offset),
        })?;
    scalar::decode_scalar(window, format)
}
