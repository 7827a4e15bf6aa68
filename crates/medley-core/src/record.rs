//! `RecordView`: a caller-supplied projector from field name to string
//! value, constructed once per input record.
use std::collections::HashMap;

/// Projects one input record's fields to UTF-8 strings for
/// [`crate::hasher::hash_record`].
///
/// An unreadable or absent field must yield the empty string rather than an
/// error — implementations should never panic here.
pub trait RecordView {
    /// Returns the trimmed UTF-8 string value of `field_name`, or an empty
    /// string if the field is absent or not representable as a string.
    fn field(&self, field_name: &str) -> String;
}

/// The default projector: a JSON object's fields coerced to strings.
///
/// Strings are used verbatim (after trimming); numbers and booleans are
/// rendered with their `Display` form; `null`, arrays, objects, and missing
/// keys all project to the empty string.
fn project_value(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_owned(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        Some(serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_)) | None => {
            String::new()
        }
    }
}

impl RecordView for HashMap<String, serde_json::Value> {
    fn field(&self, field_name: &str) -> String {
        project_value(self.get(field_name))
    }
}

impl RecordView for serde_json::Map<String, serde_json::Value> {
    fn field(&self, field_name: &str) -> String {
        project_value(self.get(field_name))
    }
}
