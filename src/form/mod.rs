mod controller;
mod view;

pub use controller::{FormController, FormEvent};
pub use view::FieldView;
