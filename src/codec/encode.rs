use crate::codec::scalar;
use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldIdx, FieldKind, FieldNode, Schema};
use crate::value::Value;
use bytes::{BufMut, Bytes, BytesMut};

impl Schema {
    /// Encode a structured value into the exact byte sequence of a field.
    ///
    /// `field_id` selects a registered field; `None` uses the pattern's
    /// default field. `value` may be `None` for fields that need no input
    /// (a lone `fixed` literal, or a combination of only `fixed` children).
    ///
    /// The returned buffer is owned by the caller and always exactly the
    /// field's declared width.
    pub fn encode(&self, value: Option<&Value>, field_id: Option<&str>) -> CodecResult<Bytes> {
        let idx = self.resolve_field(field_id)?;
        let mut dst = BytesMut::with_capacity(self.node(idx).byte_length);
        self.encode_field(value, idx, &mut dst)?;
        Ok(dst.freeze())
    }

    fn encode_field(
        &self,
        value: Option<&Value>,
        idx: FieldIdx,
        dst: &mut BytesMut,
    ) -> CodecResult<()> {
        let node = self.node(idx);
        let sub = subvalue(node, value);
        match &node.kind {
            FieldKind::Fixed { format, literal } => {
                scalar::encode_scalar(dst, *format, node.byte_length, literal)
            }
            FieldKind::Variable { format } => {
                let sub = sub.ok_or_else(|| missing_value(node))?;
                scalar::encode_scalar(dst, *format, node.byte_length, sub)
            }
            FieldKind::Index { arms, .. } => {
                let discriminant = sub.ok_or_else(|| missing_value(node))?;
                let arm = arms
                    .iter()
                    .find(|arm| arm.discriminant == *discriminant)
                    .ok_or_else(|| {
                        CodecError::UnmatchedDiscriminant(discriminant.to_string())
                    })?;
                // The target owns the full wire representation, discriminant
                // included; it re-extracts what it needs from the original
                // value.
                self.encode_field(value, arm.target, dst)
            }
            FieldKind::Combination { children } => {
                // Children lay out contiguously; each pulls its own named
                // sub-property from the same subvalue.
                for &child in children {
                    self.encode_field(sub, child, dst)?;
                }
                Ok(())
            }
            FieldKind::Array { item } => {
                let seq = sub.and_then(Value::as_seq).ok_or_else(|| {
                    CodecError::UnexpectedType(format!(
                        "array field needs a sequence, got {}",
                        sub.map_or("nothing", Value::type_name)
                    ))
                })?;
                let item_width = self.node(*item).byte_length;
                let payload = seq.len() * item_width;
                if payload > node.byte_length {
                    return Err(CodecError::ArrayOverflow {
                        payload,
                        capacity: node.byte_length,
                    });
                }
                for element in seq {
                    self.encode_field(Some(element), *item, dst)?;
                }
                dst.put_bytes(0, node.byte_length - payload);
                Ok(())
            }
        }
    }
}

/// The portion of the caller's value this node works on: the value itself
/// for unnamed nodes, the map entry under `name` otherwise.
fn subvalue<'a>(node: &FieldNode, value: Option<&'a Value>) -> Option<&'a Value> {
    match &node.name {
        None => value,
        Some(name) => value.and_then(|v| v.get(name)),
    }
}

fn missing_value(node: &FieldNode) -> CodecError {
    CodecError::UnexpectedType(match &node.name {
        Some(name) => format!("no input value under '{name}'"),
        None => "no input value for field".to_string(),
    })
}
