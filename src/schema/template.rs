use crate::error::{CodecError, CodecResult};
use crate::schema::spec::FieldSpec;
use std::collections::HashMap;

/// Inflate a field from the template it references, if any.
///
/// Runs once per field during compilation. Every attribute the template
/// defines is copied onto the field where the field does not already define
/// it; field-local attributes always win. `id` and `as-template` are never
/// copied — inheriting a template must not re-register anything. The
/// returned field carries no template reference, so inflation is trivially
/// idempotent.
///
/// A template may itself reference another template; the chain is resolved
/// depth-first and a cycle is a schema error.
pub(crate) fn inflate(
    field: &FieldSpec,
    templates: &HashMap<String, FieldSpec>,
) -> CodecResult<FieldSpec> {
    let Some(template_name) = field.template.as_deref() else {
        return Ok(field.clone());
    };

    let mut chain = Vec::new();
    let template = resolve(template_name, templates, &mut chain)?;

    let mut inflated = field.clone();
    inflated.template = None;
    merge_missing(&mut inflated, &template);
    Ok(inflated)
}

/// Resolve a template by name, inflating its own template chain first.
fn resolve(
    name: &str,
    templates: &HashMap<String, FieldSpec>,
    chain: &mut Vec<String>,
) -> CodecResult<FieldSpec> {
    if chain.iter().any(|seen| seen == name) {
        return Err(CodecError::InvalidPattern(format!(
            "template cycle: {} -> '{name}'",
            chain.join(" -> ")
        )));
    }
    chain.push(name.to_string());

    let template = templates
        .get(name)
        .ok_or_else(|| CodecError::TemplateNotFound(name.to_string()))?;

    let mut resolved = template.clone();
    if let Some(parent) = template.template.as_deref() {
        let parent = resolve(parent, templates, chain)?;
        resolved.template = None;
        merge_missing(&mut resolved, &parent);
    }
    Ok(resolved)
}

/// Copy attributes of `template` onto `field` wherever `field` lacks them.
fn merge_missing(field: &mut FieldSpec, template: &FieldSpec) {
    if field.name.is_none() {
        field.name = template.name.clone();
    }
    if field.kind.is_none() {
        field.kind = template.kind.clone();
    }
    if field.length.is_none() {
        field.length = template.length;
    }
    if field.format.is_none() {
        field.format = template.format.clone();
    }
    if field.value.is_none() {
        field.value = template.value.clone();
    }
}
