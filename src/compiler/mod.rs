mod rule;

pub use rule::{CompiledPattern, FieldRule};

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::config::{FieldDescriptor, FieldType, generate_field_name};

/// One field after compilation: everything the controller and the render
/// layer need, keyed by the generated name.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub label: String,
    pub widget: FieldType,
    pub rule: FieldRule,
    pub options: Vec<String>,
    pub default: Value,
}

impl CompiledField {
    pub fn required(&self) -> bool {
        self.rule.required()
    }
}

/// The derived, per-company artifact: ordered rules and defaults for one
/// field list. Recomputed on every company switch, never persisted.
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    fields: IndexMap<String, CompiledField>,
}

impl CompiledSchema {
    pub fn fields(&self) -> impl Iterator<Item = &CompiledField> {
        self.fields.values()
    }

    pub fn get(&self, name: &str) -> Option<&CompiledField> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Default-value record for the same keys as the schema.
    pub fn defaults(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.default.clone()))
            .collect()
    }
}

/// Compilation failures that cannot be recovered per-field.
///
/// The name generator is not injective, so two labels can map to the same
/// key; silently overwriting one field's rule with another's is never
/// acceptable, so the whole list is rejected instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    DuplicateFieldName { name: String, label: String },
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::DuplicateFieldName { name, label } => write!(
                f,
                "label '{label}' maps to field name '{name}', which is already taken"
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Translate an ordered field-descriptor list into a validation schema and
/// default set. Pure: the same list always compiles to the same schema.
///
/// An unparseable per-field regex is logged and dropped rather than failing
/// the compile; malformed per-field configuration must not block the rest of
/// the form.
pub fn compile(fields: &[FieldDescriptor]) -> Result<CompiledSchema, CompileError> {
    let mut compiled: IndexMap<String, CompiledField> = IndexMap::with_capacity(fields.len());
    for field in fields {
        let name = generate_field_name(&field.label);
        let required = field.required();
        let rule = match field.field_type {
            FieldType::Email => FieldRule::Email { required },
            FieldType::Number => FieldRule::Number { required },
            FieldType::Text | FieldType::Date | FieldType::Textarea | FieldType::Select => {
                FieldRule::String {
                    required,
                    pattern: compile_pattern(field),
                }
            }
        };
        let entry = CompiledField {
            name: name.clone(),
            label: field.label.clone(),
            widget: field.field_type,
            default: rule.default_value(),
            rule,
            options: field.options.clone().unwrap_or_default(),
        };
        if compiled.insert(name.clone(), entry).is_some() {
            return Err(CompileError::DuplicateFieldName {
                name,
                label: field.label.clone(),
            });
        }
    }
    Ok(CompiledSchema { fields: compiled })
}

fn compile_pattern(field: &FieldDescriptor) -> Option<CompiledPattern> {
    let source = field.pattern()?;
    match Regex::new(source) {
        Ok(regex) => Some(CompiledPattern {
            regex,
            description: field.pattern_description().map(str::to_string),
        }),
        Err(err) => {
            warn!(
                label = %field.label,
                pattern = %source,
                error = %err,
                "skipping unparseable pattern constraint"
            );
            None
        }
    }
}
