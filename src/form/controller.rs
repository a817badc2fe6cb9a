use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::compiler::CompiledSchema;

use super::view::FieldView;

/// Notifications drained by whoever drives the controller. The queue is the
/// observer seam: the terminal runtime polls it between frames, tests assert
/// on it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    ValueChanged { name: String },
    ErrorsChanged,
    Submitted,
}

/// Live entry state for one compiled schema.
///
/// Raw entries are kept as strings no matter the field type; coercion to
/// typed values happens only when a rule runs. Validation never rewrites an
/// entry, so the user keeps whatever they typed while fixing errors.
#[derive(Debug)]
pub struct FormController {
    schema: CompiledSchema,
    values: IndexMap<String, String>,
    errors: IndexMap<String, String>,
    events: Vec<FormEvent>,
    dirty: bool,
}

impl FormController {
    pub fn new(schema: CompiledSchema) -> Self {
        let values = schema
            .fields()
            .map(|field| (field.name.clone(), String::new()))
            .collect();
        Self {
            schema,
            values,
            errors: IndexMap::new(),
            events: Vec::new(),
            dirty: false,
        }
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Update one field's raw entry. A name the schema does not know is
    /// ignored; stale names can arrive from a driver that outlived a
    /// company switch.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        let Some(slot) = self.values.get_mut(name) else {
            debug!(field = name, "ignoring value for unknown field");
            return;
        };
        let value = value.into();
        if *slot == value {
            return;
        }
        *slot = value;
        self.dirty = true;
        self.events.push(FormEvent::ValueChanged {
            name: name.to_string(),
        });
    }

    /// The raw entry for a field; unknown names read as empty.
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True once any entry differs from its seed and no submit or reset has
    /// happened since.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run every rule against the current entries without consuming them.
    /// Returns whether the form is currently valid.
    pub fn validate(&mut self) -> bool {
        let mut errors = IndexMap::new();
        for field in self.schema.fields() {
            if let Err(message) = field.rule.validate(&field.label, self.value(&field.name)) {
                errors.insert(field.name.clone(), message);
            }
        }
        let valid = errors.is_empty();
        self.replace_errors(errors);
        valid
    }

    /// Validate and, when every rule passes, hand back the coerced record
    /// and return the form to its pristine state. On failure the entries are
    /// left untouched and the per-field messages are exposed instead.
    ///
    /// Fields whose rule reports "no value" are omitted from the record
    /// rather than written as nulls or empty strings.
    pub fn submit(&mut self) -> Result<Map<String, Value>, IndexMap<String, String>> {
        let mut record = Map::new();
        let mut errors = IndexMap::new();
        for field in self.schema.fields() {
            match field.rule.validate(&field.label, self.value(&field.name)) {
                Ok(Some(value)) => {
                    record.insert(field.name.clone(), value);
                }
                Ok(None) => {}
                Err(message) => {
                    errors.insert(field.name.clone(), message);
                }
            }
        }
        if !errors.is_empty() {
            self.replace_errors(errors.clone());
            return Err(errors);
        }
        self.reset();
        self.events.push(FormEvent::Submitted);
        Ok(record)
    }

    /// Discard entries and errors, returning to the post-construction state.
    pub fn reset(&mut self) {
        for value in self.values.values_mut() {
            value.clear();
        }
        self.replace_errors(IndexMap::new());
        self.dirty = false;
    }

    /// Per-field render snapshots in schema order.
    pub fn field_views(&self) -> impl Iterator<Item = FieldView<'_>> {
        self.schema.fields().map(|field| FieldView {
            name: &field.name,
            label: &field.label,
            widget: field.widget,
            required: field.required(),
            options: &field.options,
            value: self.value(&field.name),
            error: self.error(&field.name),
        })
    }

    fn replace_errors(&mut self, errors: IndexMap<String, String>) {
        if self.errors != errors {
            self.errors = errors;
            self.events.push(FormEvent::ErrorsChanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::CompanyConfig;
    use serde_json::json;

    fn controller() -> FormController {
        let doc = json!({
            "Acme Retail": {
                "FormFields": [
                    {"Label": "Store Name", "Type": "text", "Validation": {"required": true}},
                    {"Label": "Contact Email", "Type": "email"},
                    {"Label": "Fleet Size", "Type": "number"},
                    {
                        "Label": "Postcode",
                        "Type": "text",
                        "Validation": {
                            "pattern": "^[0-9]{4}$",
                            "patternDescription": "Four digits"
                        }
                    },
                    {"Label": "Region", "Type": "select", "Options": ["North", "South"]}
                ]
            }
        });
        let config = CompanyConfig::from_value(&doc).expect("config");
        let schema = compile(config.fields_for("Acme Retail").expect("fields")).expect("schema");
        FormController::new(schema)
    }

    #[test]
    fn starts_pristine_with_empty_entries() {
        let form = controller();
        assert!(!form.is_dirty());
        assert_eq!(form.error_count(), 0);
        assert_eq!(form.value("storeName"), "");
        assert_eq!(form.value("fleetSize"), "");
    }

    #[test]
    fn setting_a_value_marks_dirty_and_emits_an_event() {
        let mut form = controller();
        form.set_value("storeName", "Downtown");
        assert!(form.is_dirty());
        assert_eq!(
            form.take_events(),
            vec![FormEvent::ValueChanged {
                name: "storeName".to_string()
            }]
        );
    }

    #[test]
    fn rewriting_the_same_value_is_silent() {
        let mut form = controller();
        form.set_value("storeName", "");
        assert!(!form.is_dirty());
        assert!(form.take_events().is_empty());
    }

    #[test]
    fn unknown_field_names_are_ignored() {
        let mut form = controller();
        form.set_value("noSuchField", "x");
        assert!(!form.is_dirty());
        assert_eq!(form.value("noSuchField"), "");
        assert!(form.take_events().is_empty());
    }

    #[test]
    fn validate_reports_errors_without_consuming_entries() {
        let mut form = controller();
        form.set_value("fleetSize", "not a number");
        assert!(!form.validate());
        assert_eq!(form.error("storeName"), Some("Store Name is required"));
        assert_eq!(form.error("fleetSize"), Some("Fleet Size must be a number"));
        assert_eq!(form.value("fleetSize"), "not a number");
        assert_eq!(form.error_count(), 2);
    }

    #[test]
    fn fixing_an_entry_clears_its_error_on_revalidation() {
        let mut form = controller();
        form.set_value("storeName", "Downtown");
        form.set_value("contactEmail", "nope");
        form.validate();
        assert_eq!(form.error("contactEmail"), Some("Invalid email address"));

        form.set_value("contactEmail", "ops@acme.example");
        assert!(form.validate());
        assert_eq!(form.error_count(), 0);
    }

    #[test]
    fn pattern_errors_use_the_configured_description() {
        let mut form = controller();
        form.set_value("storeName", "Downtown");
        form.set_value("postcode", "12");
        form.validate();
        assert_eq!(form.error("postcode"), Some("Four digits"));
    }

    #[test]
    fn submit_coerces_entries_and_omits_absent_optionals() {
        let mut form = controller();
        form.set_value("storeName", "Downtown");
        form.set_value("fleetSize", "7");
        let record = form.submit().expect("record");

        assert_eq!(record["storeName"], json!("Downtown"));
        assert_eq!(record["fleetSize"], json!(7.0));
        assert!(record.get("contactEmail").is_none());
        assert!(record.get("region").is_none());

        assert!(!form.is_dirty());
        assert_eq!(form.value("storeName"), "");
        assert!(form.take_events().contains(&FormEvent::Submitted));
    }

    #[test]
    fn failed_submit_keeps_entries_and_exposes_errors() {
        let mut form = controller();
        form.set_value("fleetSize", "abc");
        let errors = form.submit().expect_err("errors");
        assert_eq!(errors["storeName"], "Store Name is required");
        assert_eq!(errors["fleetSize"], "Fleet Size must be a number");
        assert_eq!(form.value("fleetSize"), "abc");
        assert!(form.is_dirty());
        assert!(form.take_events().contains(&FormEvent::ErrorsChanged));
    }

    #[test]
    fn reset_returns_to_the_pristine_state() {
        let mut form = controller();
        form.set_value("storeName", "Downtown");
        form.validate();
        form.reset();
        assert!(!form.is_dirty());
        assert_eq!(form.error_count(), 0);
        assert_eq!(form.value("storeName"), "");
    }

    #[test]
    fn field_views_pair_entries_with_compiled_metadata() {
        let mut form = controller();
        form.set_value("region", "South");
        form.set_value("fleetSize", "x");
        form.validate();

        let views: Vec<_> = form.field_views().collect();
        assert_eq!(views.len(), 5);
        assert_eq!(views[0].name, "storeName");
        assert!(views[0].required);
        assert_eq!(views[2].error, Some("Fleet Size must be a number"));
        assert_eq!(views[4].value, "South");
        assert_eq!(views[4].options, ["North", "South"]);
        assert!(views[4].widget.is_select());
    }
}
