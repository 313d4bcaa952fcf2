use serde::Deserialize;

/// One field node of a message pattern, as authored.
///
/// Every attribute is optional at this layer: a field may receive missing
/// attributes from a template during compilation, and validation of the
/// assembled node happens there. The `value` attribute is kept as raw JSON
/// because its meaning depends on `type`: a literal array for `fixed`, a
/// child field list for `combination`/`array`, a discriminant item list
/// (`{"value": .., "id": ".."}`) for `index`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldSpec {
    /// Registers the field for lookup by callers and index targets.
    pub id: Option<String>,
    /// Key under which encode reads and decode writes this field's value.
    /// Absent means pass-through: the field works on the caller's value
    /// directly.
    pub name: Option<String>,
    /// Field kind tag: `fixed | variable | index | combination | array`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Exact encoded width in bytes.
    pub length: Option<usize>,
    /// Scalar wire format tag: `int | int.le | int.be | string | bcd`.
    pub format: Option<String>,
    /// Kind-dependent payload, see the struct docs.
    pub value: Option<serde_json::Value>,
    /// Name of a template this field inherits attributes from.
    pub template: Option<String>,
    /// Name under which this field registers itself as a template.
    #[serde(rename = "as-template")]
    pub as_template: Option<String>,
}

/// Root of a pattern: one field, or an ordered list of sibling fields.
///
/// With a list root the first element is the default field used when a
/// caller supplies no field id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Single(FieldSpec),
    List(Vec<FieldSpec>),
}

impl PatternSpec {
    pub(crate) fn fields(&self) -> &[FieldSpec] {
        match self {
            PatternSpec::Single(field) => std::slice::from_ref(field),
            PatternSpec::List(fields) => fields,
        }
    }
}

impl From<FieldSpec> for PatternSpec {
    fn from(field: FieldSpec) -> Self {
        PatternSpec::Single(field)
    }
}

impl From<Vec<FieldSpec>> for PatternSpec {
    fn from(fields: Vec<FieldSpec>) -> Self {
        PatternSpec::List(fields)
    }
}
