mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{
    CONFIG_FETCH_RETRIES, ConfigCache, ConfigSource, parse_company_config_str, parse_document_str,
};
pub use output::{EmitOptions, RecordSink, emit_record};
