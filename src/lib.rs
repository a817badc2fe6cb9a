#![deny(rust_2018_idioms)]

mod compiler;
mod config;
mod form;
mod io;
mod runtime;
mod session;
mod ui;

pub use compiler::{CompileError, CompiledField, CompiledPattern, CompiledSchema, FieldRule, compile};
pub use config::{
    CompanyConfig, CompanyEntry, FieldDescriptor, FieldType, ValidationSpec, generate_field_name,
};
pub use form::{FieldView, FormController, FormEvent};
pub use io::{
    CONFIG_FETCH_RETRIES, ConfigCache, ConfigSource, DocumentFormat, EmitOptions, RecordSink,
    emit_record, parse_company_config_str, parse_document_str,
};
pub use runtime::{DynFormUI, Submission, UiOptions};
pub use session::CompanySession;

pub mod prelude {
    pub use super::{CompanyConfig, DynFormUI, Submission, UiOptions};
}
