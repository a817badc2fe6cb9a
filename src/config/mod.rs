mod model;
mod name;

pub use model::{CompanyConfig, CompanyEntry, FieldDescriptor, FieldType, ValidationSpec};
pub use name::generate_field_name;
