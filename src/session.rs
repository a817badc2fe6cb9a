use tracing::debug;

use crate::compiler::{CompileError, compile};
use crate::config::CompanyConfig;
use crate::form::FormController;

#[derive(Debug)]
struct ActiveForm {
    key: String,
    controller: FormController,
}

/// Top-level selection state: which company is active and the live form
/// controller for its field set.
///
/// The session moves between "no company selected" and "company selected";
/// the only transition trigger is an explicit `select` with a key present in
/// the configuration. Selecting recompiles the field list and replaces the
/// controller wholesale, so no values or errors ever leak between companies.
#[derive(Debug)]
pub struct CompanySession {
    config: CompanyConfig,
    active: Option<ActiveForm>,
}

impl CompanySession {
    pub fn new(config: CompanyConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &CompanyConfig {
        &self.config
    }

    /// Company keys in document order; this is the selector's display order.
    pub fn company_keys(&self) -> impl Iterator<Item = &str> {
        self.config.keys()
    }

    pub fn selected_company(&self) -> Option<&str> {
        self.active.as_ref().map(|form| form.key.as_str())
    }

    pub fn controller(&self) -> Option<&FormController> {
        self.active.as_ref().map(|form| &form.controller)
    }

    pub fn controller_mut(&mut self) -> Option<&mut FormController> {
        self.active.as_mut().map(|form| &mut form.controller)
    }

    /// Select a company. Returns `Ok(true)` when the selection changed state;
    /// a key missing from the configuration is a defensive no-op (`Ok(false)`)
    /// since the selector only offers known keys.
    pub fn select(&mut self, key: &str) -> Result<bool, CompileError> {
        let Some(fields) = self.config.fields_for(key) else {
            debug!(company = key, "ignoring selection of unknown company");
            return Ok(false);
        };
        let schema = compile(fields)?;
        debug!(company = key, fields = schema.len(), "company selected");
        self.active = Some(ActiveForm {
            key: key.to_string(),
            controller: FormController::new(schema),
        });
        Ok(true)
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }
}
