use crate::config::FieldType;

/// One field row at the rendering boundary: borrowed snapshots of the
/// compiled metadata plus the live entry state. Rebuilt per frame, never
/// stored.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub widget: FieldType,
    pub required: bool,
    pub options: &'a [String],
    pub value: &'a str,
    pub error: Option<&'a str>,
}
