/// Derive the stable internal key for a field from its display label.
///
/// Every character that is not an ASCII letter, digit, or space is stripped,
/// then the remainder is camel-cased: the first character is lower-cased, the
/// first character of each later token is upper-cased, and all separating
/// whitespace is removed. Total and deterministic for any input, including
/// the empty string.
///
/// The function is the single source of truth for field keys: the compiler
/// and the form controller both call it with the same label, so they agree
/// on keys without sharing a registry. It is not injective across arbitrary
/// labels (labels differing only in stripped punctuation collide); the
/// compiler rejects field lists whose labels collide.
pub fn generate_field_name(label: &str) -> String {
    let mut name = String::with_capacity(label.len());
    let mut at_boundary = false;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if name.is_empty() {
                name.push(ch.to_ascii_lowercase());
            } else if at_boundary {
                name.push(ch.to_ascii_uppercase());
            } else {
                name.push(ch);
            }
            at_boundary = false;
        } else if ch == ' ' {
            at_boundary = true;
        }
    }
    name
}
