use crate::codec::scalar::WireFormat;
use crate::error::{CodecError, CodecResult};
use crate::schema::spec::{FieldSpec, PatternSpec};
use crate::schema::template;
use crate::value::Value;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Index of a compiled field node inside the schema arena.
pub(crate) type FieldIdx = usize;

/// One fully-resolved field node.
///
/// Nodes are immutable after compilation: templates are already inflated and
/// index arms point at their targets directly.
#[derive(Debug)]
pub(crate) struct FieldNode {
    /// Key under which encode reads and decode writes this node's value.
    pub name: Option<String>,
    /// Exact encoded width of this node in bytes.
    pub byte_length: usize,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub(crate) enum FieldKind {
    /// Constant leaf: always encodes `literal`, must decode-match it.
    Fixed { format: WireFormat, literal: Value },
    /// Scalar leaf carrying the caller's value.
    Variable { format: WireFormat },
    /// Discriminated union: one decoded scalar selects the arm whose target
    /// owns the full wire representation.
    Index {
        format: WireFormat,
        arms: Vec<IndexArm>,
    },
    /// Record of sequentially laid-out child nodes.
    Combination { children: Vec<FieldIdx> },
    /// Repeated sequence of one item node within a declared capacity.
    Array { item: FieldIdx },
}

#[derive(Debug)]
pub(crate) struct IndexArm {
    pub discriminant: Value,
    pub target: FieldIdx,
}

/// Discriminant item of an `index` field as authored: `{"value": .., "id": ..}`.
#[derive(Debug, Deserialize)]
struct IndexItemSpec {
    value: serde_json::Value,
    id: String,
}

/// A compiled message pattern.
///
/// Construction is the only mutating phase; afterwards the schema is shared,
/// read-only state and one instance serves arbitrarily many encode/decode
/// calls.
#[derive(Debug)]
pub struct Schema {
    nodes: Vec<FieldNode>,
    fields_by_id: HashMap<String, FieldIdx>,
    default_field: FieldIdx,
}

impl Schema {
    /// Compile an authored pattern into an immutable schema.
    ///
    /// Registers ids and templates, inflates every template reference,
    /// validates each assembled node and resolves index targets into direct
    /// node references. With a list root the first element becomes the
    /// default field.
    pub fn compile(pattern: &PatternSpec) -> CodecResult<Schema> {
        let roots = pattern.fields();
        if roots.is_empty() {
            return Err(CodecError::InvalidPattern("empty pattern".to_string()));
        }

        // Registration walk over the raw tree: duplicate detection and the
        // template table. Recursion keys off the raw `type` tag, so nested
        // addressable fields become reachable without being top-level
        // siblings.
        let mut ids = HashSet::new();
        let mut templates = HashMap::new();
        for root in roots {
            register(root, &mut ids, &mut templates)?;
        }

        let mut compiler = Compiler {
            templates: &templates,
            nodes: Vec::new(),
            fields_by_id: HashMap::new(),
            pending_arms: Vec::new(),
        };

        let mut default_field = 0;
        for (i, root) in roots.iter().enumerate() {
            let idx = compiler.build(root)?;
            if i == 0 {
                default_field = idx;
            }
        }
        compiler.resolve_index_arms()?;

        tracing::debug!(
            nodes = compiler.nodes.len(),
            ids = compiler.fields_by_id.len(),
            templates = templates.len(),
            "compiled message pattern"
        );

        Ok(Schema {
            nodes: compiler.nodes,
            fields_by_id: compiler.fields_by_id,
            default_field,
        })
    }

    /// Parse a JSON pattern document and compile it.
    pub fn from_json(text: &str) -> CodecResult<Schema> {
        let pattern: PatternSpec = serde_json::from_str(text)
            .map_err(|e| CodecError::InvalidPattern(format!("pattern JSON: {e}")))?;
        Schema::compile(&pattern)
    }

    /// Registered field ids, in no particular order.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields_by_id.keys().map(String::as_str)
    }

    pub(crate) fn node(&self, idx: FieldIdx) -> &FieldNode {
        &self.nodes[idx]
    }

    /// Resolve an optional caller-supplied field id to a node.
    pub(crate) fn resolve_field(&self, field_id: Option<&str>) -> CodecResult<FieldIdx> {
        match field_id {
            None => Ok(self.default_field),
            Some(id) => self
                .fields_by_id
                .get(id)
                .copied()
                .ok_or_else(|| CodecError::UnknownField(id.to_string())),
        }
    }
}

/// Register ids and templates of a raw field and its raw children.
fn register(
    spec: &FieldSpec,
    ids: &mut HashSet<String>,
    templates: &mut HashMap<String, FieldSpec>,
) -> CodecResult<()> {
    if let Some(id) = &spec.id {
        if !ids.insert(id.clone()) {
            return Err(CodecError::DuplicateField(id.clone()));
        }
    }
    if let Some(name) = &spec.as_template {
        if templates.insert(name.clone(), spec.clone()).is_some() {
            return Err(CodecError::DuplicateTemplate(name.clone()));
        }
    }
    if matches!(spec.kind.as_deref(), Some("combination" | "array")) {
        for child in child_specs(spec)? {
            register(&child, ids, templates)?;
        }
    }
    Ok(())
}

/// Interpret a structured field's `value` attribute as a child field list.
fn child_specs(spec: &FieldSpec) -> CodecResult<Vec<FieldSpec>> {
    let value = spec
        .value
        .as_ref()
        .ok_or_else(|| CodecError::InvalidPattern("structured field has no children".into()))?;
    serde_json::from_value(value.clone())
        .map_err(|e| CodecError::InvalidPattern(format!("child field list: {e}")))
}

struct Compiler<'a> {
    templates: &'a HashMap<String, FieldSpec>,
    nodes: Vec<FieldNode>,
    fields_by_id: HashMap<String, FieldIdx>,
    /// Index arms keep their target ids until every node exists.
    pending_arms: Vec<(FieldIdx, Vec<(Value, String)>)>,
}

impl Compiler<'_> {
    fn build(&mut self, raw: &FieldSpec) -> CodecResult<FieldIdx> {
        let spec = template::inflate(raw, self.templates)?;

        let kind_tag = spec
            .kind
            .as_deref()
            .ok_or_else(|| CodecError::InvalidPattern(field_err(&spec, "has no type")))?;
        let byte_length = spec
            .length
            .ok_or_else(|| CodecError::InvalidPattern(field_err(&spec, "has no length")))?;
        if byte_length == 0 {
            return Err(CodecError::InvalidPattern(field_err(
                &spec,
                "has zero length",
            )));
        }

        let mut raw_arms = None;
        let kind = match kind_tag {
            "fixed" => {
                let format = leaf_format(&spec, byte_length)?;
                let literal = fixed_literal(&spec, format)?;
                FieldKind::Fixed { format, literal }
            }
            "variable" => FieldKind::Variable {
                format: leaf_format(&spec, byte_length)?,
            },
            "index" => {
                let format = leaf_format(&spec, byte_length)?;
                raw_arms = Some(index_items(&spec)?);
                FieldKind::Index {
                    format,
                    arms: Vec::new(),
                }
            }
            "combination" => {
                let mut children = Vec::new();
                let mut width = 0;
                for child in child_specs(&spec)? {
                    let idx = self.build(&child)?;
                    width += self.nodes[idx].byte_length;
                    children.push(idx);
                }
                if width != byte_length {
                    return Err(CodecError::InvalidPattern(format!(
                        "combination length {byte_length} differs from children sum {width}"
                    )));
                }
                FieldKind::Combination { children }
            }
            "array" => {
                let children = child_specs(&spec)?;
                let item_spec = children.first().ok_or_else(|| {
                    CodecError::InvalidPattern(field_err(&spec, "array has no item field"))
                })?;
                FieldKind::Array {
                    item: self.build(item_spec)?,
                }
            }
            other => {
                return Err(CodecError::InvalidPattern(format!(
                    "unknown field type '{other}'"
                )))
            }
        };

        let idx = self.nodes.len();
        self.nodes.push(FieldNode {
            name: spec.name.clone(),
            byte_length,
            kind,
        });
        if let Some(arms) = raw_arms {
            self.pending_arms.push((idx, arms));
        }
        // Duplicates were rejected on the raw tree; when a template's child
        // list is instantiated at several consumer sites the first-built
        // node keeps the id.
        if let Some(id) = spec.id {
            self.fields_by_id.entry(id).or_insert(idx);
        }
        Ok(idx)
    }

    /// Replace recorded target ids with direct node references.
    fn resolve_index_arms(&mut self) -> CodecResult<()> {
        for (idx, raw) in self.pending_arms.drain(..) {
            let mut arms = Vec::with_capacity(raw.len());
            for (discriminant, target_id) in raw {
                let target = self
                    .fields_by_id
                    .get(&target_id)
                    .copied()
                    .ok_or(CodecError::UnknownField(target_id))?;
                arms.push(IndexArm {
                    discriminant,
                    target,
                });
            }
            match &mut self.nodes[idx].kind {
                FieldKind::Index { arms: slot, .. } => *slot = arms,
                _ => unreachable!("pending arms recorded for a non-index node"),
            }
        }
        Ok(())
    }
}

/// Parse and width-check a leaf field's format tag.
fn leaf_format(spec: &FieldSpec, byte_length: usize) -> CodecResult<WireFormat> {
    let tag = spec
        .format
        .as_deref()
        .ok_or_else(|| CodecError::InvalidPattern(field_err(spec, "has no format")))?;
    let format =
        WireFormat::parse(tag).ok_or_else(|| CodecError::UnsupportedFormat(tag.to_string()))?;
    match format {
        WireFormat::IntLe | WireFormat::IntBe if byte_length > 8 => Err(
            CodecError::InvalidPattern(field_err(spec, "integer field wider than 8 bytes")),
        ),
        WireFormat::Bcd if byte_length != 1 => Err(CodecError::InvalidPattern(field_err(
            spec,
            "bcd field must be 1 byte",
        ))),
        _ => Ok(format),
    }
}

/// Extract a fixed field's literal: first element of its `value` array,
/// shaped to match the wire format.
fn fixed_literal(spec: &FieldSpec, format: WireFormat) -> CodecResult<Value> {
    let items = match spec.value.as_ref() {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items,
        _ => {
            return Err(CodecError::InvalidPattern(field_err(
                spec,
                "fixed field needs a non-empty literal array",
            )))
        }
    };
    let literal = Value::from_json(&items[0])?;
    match (format, &literal) {
        (WireFormat::Str, Value::Str(_)) => Ok(literal),
        (WireFormat::IntLe | WireFormat::IntBe | WireFormat::Bcd, Value::Int(_)) => Ok(literal),
        _ => Err(CodecError::InvalidPattern(format!(
            "fixed literal {literal:?} does not fit format {}",
            format.as_str()
        ))),
    }
}

/// Parse an index field's discriminant items.
fn index_items(spec: &FieldSpec) -> CodecResult<Vec<(Value, String)>> {
    let value = spec
        .value
        .as_ref()
        .ok_or_else(|| CodecError::InvalidPattern(field_err(spec, "index has no items")))?;
    let items: Vec<IndexItemSpec> = serde_json::from_value(value.clone())
        .map_err(|e| CodecError::InvalidPattern(format!("index item list: {e}")))?;

    let mut arms = Vec::with_capacity(items.len());
    for item in items {
        let discriminant = Value::from_json(&item.value)?;
        if !matches!(discriminant, Value::Int(_) | Value::Str(_)) {
            return Err(CodecError::InvalidPattern(format!(
                "index discriminant must be a scalar, got {}",
                discriminant.type_name()
            )));
        }
        arms.push((discriminant, item.id));
    }
    Ok(arms)
}

fn field_err(spec: &FieldSpec, what: &str) -> String {
    match (&spec.id, &spec.name) {
        (Some(id), _) => format!("field '{id}' {what}"),
        (None, Some(name)) => format!("field '{name}' {what}"),
        (None, None) => format!("field {what}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(json: serde_json::Value) -> CodecResult<Schema> {
        let pattern: PatternSpec = serde_json::from_value(json).unwrap();
        Schema::compile(&pattern)
    }

    #[test]
    fn single_root_becomes_default() {
        let schema = compile(json!({
            "id": "battery", "name": "battery-level",
            "type": "variable", "length": 1, "format": "int"
        }))
        .unwrap();

        assert_eq!(schema.resolve_field(None).unwrap(), 0);
        assert_eq!(schema.resolve_field(Some("battery")).unwrap(), 0);
        assert!(matches!(
            schema.resolve_field(Some("missing")),
            Err(CodecError::UnknownField(_))
        ));
    }

    #[test]
    fn nested_ids_are_reachable() {
        let schema = compile(json!([{
            "id": "frame", "type": "combination", "length": 3,
            "value": [
                {"type": "fixed", "length": 1, "format": "int", "value": [2]},
                {"id": "payload", "name": "count",
                 "type": "variable", "length": 2, "format": "int.le"}
            ]
        }]))
        .unwrap();

        let payload = schema.resolve_field(Some("payload")).unwrap();
        assert_eq!(schema.node(payload).byte_length, 2);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = compile(json!([
            {"id": "x", "type": "variable", "length": 1, "format": "int"},
            {"id": "x", "type": "variable", "length": 1, "format": "int"}
        ]))
        .unwrap_err();
        assert!(matches!(err, CodecError::DuplicateField(id) if id == "x"));
    }

    #[test]
    fn duplicate_template_is_rejected() {
        let err = compile(json!([
            {"as-template": "t", "type": "variable", "length": 1, "format": "int"},
            {"as-template": "t", "type": "variable", "length": 2, "format": "int"}
        ]))
        .unwrap_err();
        assert!(matches!(err, CodecError::DuplicateTemplate(name) if name == "t"));
    }

    #[test]
    fn combination_length_sum_is_enforced() {
        let err = compile(json!({
            "type": "combination", "length": 4,
            "value": [
                {"type": "variable", "name": "a", "length": 1, "format": "int"},
                {"type": "variable", "name": "b", "length": 2, "format": "int"}
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("differs from children sum"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = compile(json!({
            "type": "variable", "length": 1, "format": "int.me"
        }))
        .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat(tag) if tag == "int.me"));
    }

    #[test]
    fn bcd_width_is_enforced() {
        let err = compile(json!({
            "type": "variable", "length": 2, "format": "bcd"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("bcd field must be 1 byte"));
    }

    #[test]
    fn unresolved_index_target_fails_at_compile() {
        let err = compile(json!({
            "name": "command", "type": "index", "length": 1, "format": "int",
            "value": [{"value": 1, "id": "nowhere"}]
        }))
        .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField(id) if id == "nowhere"));
    }

    #[test]
    fn template_supplies_kind_and_width() {
        let schema = compile(json!([
            {"as-template": "u32", "id": "proto",
             "type": "variable", "length": 4, "format": "int.le"},
            {"id": "start", "name": "start-time", "template": "u32"}
        ]))
        .unwrap();

        let start = schema.resolve_field(Some("start")).unwrap();
        let node = schema.node(start);
        assert_eq!(node.byte_length, 4);
        assert!(matches!(
            node.kind,
            FieldKind::Variable {
                format: WireFormat::IntLe
            }
        ));
    }

    #[test]
    fn from_json_rejects_malformed_documents() {
        assert!(matches!(
            Schema::from_json("not json"),
            Err(CodecError::InvalidPattern(_))
        ));
        assert!(matches!(
            Schema::from_json("[]"),
            Err(CodecError::InvalidPattern(_))
        ));
    }
}
