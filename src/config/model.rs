use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widget, coercion, and validation strategy for one form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Date,
    Textarea,
    Select,
}

impl FieldType {
    pub fn is_select(self) -> bool {
        matches!(self, FieldType::Select)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
        }
    }
}

/// Optional validation rules attached to a field descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationSpec {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(
        default,
        rename = "patternDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub pattern_description: Option<String>,
}

/// One configurable input: display label, type tag, and optional rules.
///
/// The label doubles as the seed for the generated field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Type")]
    pub field_type: FieldType,
    #[serde(rename = "Validation", default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSpec>,
    #[serde(rename = "Options", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FieldDescriptor {
    pub fn required(&self) -> bool {
        self.validation.as_ref().is_some_and(|spec| spec.required)
    }

    pub fn pattern(&self) -> Option<&str> {
        self.validation.as_ref()?.pattern.as_deref()
    }

    pub fn pattern_description(&self) -> Option<&str> {
        self.validation.as_ref()?.pattern_description.as_deref()
    }
}

/// The per-company form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyEntry {
    #[serde(rename = "FormFields")]
    pub form_fields: Vec<FieldDescriptor>,
}

/// Ordered mapping from company key to its form definition.
///
/// Key order is the source document's order and drives the selector display.
/// The document is validated whole at the boundary; no partially valid
/// configuration ever reaches the rest of the system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyConfig(IndexMap<String, CompanyEntry>);

impl CompanyConfig {
    /// Deserialize and shape-check a configuration document. Fail closed.
    pub fn from_value(value: &Value) -> Result<Self> {
        let config: CompanyConfig = serde_json::from_value(value.clone())
            .context("configuration document does not match the expected shape")?;
        config.check_shape()?;
        Ok(config)
    }

    fn check_shape(&self) -> Result<()> {
        for (company, entry) in &self.0 {
            for field in &entry.form_fields {
                if field.field_type.is_select()
                    && field.options.as_ref().is_none_or(|options| options.is_empty())
                {
                    bail!(
                        "company '{company}': select field '{}' must provide options",
                        field.label
                    );
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Company keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn fields_for(&self, key: &str) -> Option<&[FieldDescriptor]> {
        self.0.get(key).map(|entry| entry.form_fields.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldDescriptor])> {
        self.0
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.form_fields.as_slice()))
    }
}

impl FromIterator<(String, CompanyEntry)> for CompanyConfig {
    fn from_iter<I: IntoIterator<Item = (String, CompanyEntry)>>(iter: I) -> Self {
        CompanyConfig(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "Acme Retail": {
                "FormFields": [
                    {"Label": "Store Name", "Type": "text", "Validation": {"required": true}},
                    {"Label": "Contact Email", "Type": "email"},
                    {
                        "Label": "Region",
                        "Type": "select",
                        "Options": ["North", "South"]
                    }
                ]
            },
            "Globex Logistics": {
                "FormFields": [
                    {"Label": "Fleet Size", "Type": "number"}
                ]
            }
        })
    }

    #[test]
    fn parses_a_well_formed_document() {
        let config = CompanyConfig::from_value(&sample_document()).expect("config");
        assert_eq!(config.len(), 2);
        let fields = config.fields_for("Acme Retail").expect("fields");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].label, "Store Name");
        assert!(fields[0].required());
        assert_eq!(fields[1].field_type, FieldType::Email);
        assert!(!fields[1].required());
    }

    #[test]
    fn preserves_document_key_order() {
        let config = CompanyConfig::from_value(&sample_document()).expect("config");
        let keys: Vec<_> = config.keys().collect();
        assert_eq!(keys, vec!["Acme Retail", "Globex Logistics"]);
    }

    #[test]
    fn rejects_missing_form_fields() {
        let doc = json!({"Broken Co": {}});
        assert!(CompanyConfig::from_value(&doc).is_err());
    }

    #[test]
    fn rejects_unknown_type_tags() {
        let doc = json!({
            "Broken Co": {
                "FormFields": [{"Label": "Thing", "Type": "multiselect"}]
            }
        });
        assert!(CompanyConfig::from_value(&doc).is_err());
    }

    #[test]
    fn rejects_select_without_options() {
        let doc = json!({
            "Broken Co": {
                "FormFields": [{"Label": "Region", "Type": "select"}]
            }
        });
        let err = CompanyConfig::from_value(&doc).expect_err("shape error");
        assert!(err.to_string().contains("Region"));
    }

    #[test]
    fn pattern_description_uses_camel_case_key() {
        let doc = json!({
            "Acme Retail": {
                "FormFields": [{
                    "Label": "Postcode",
                    "Type": "text",
                    "Validation": {
                        "pattern": "^[0-9]{4}$",
                        "patternDescription": "Four digits"
                    }
                }]
            }
        });
        let config = CompanyConfig::from_value(&doc).expect("config");
        let field = &config.fields_for("Acme Retail").unwrap()[0];
        assert_eq!(field.pattern(), Some("^[0-9]{4}$"));
        assert_eq!(field.pattern_description(), Some("Four digits"));
    }
}
