//! Record traits the query engine evaluates filters against

use crate::core::field::FieldValue;

/// A record that can be searched, filtered and sorted by field name.
///
/// Implementations map declared field keys (the same keys the resource schema
/// lists) to values. Unknown keys return `None`, which filters treat as null.
///
/// ```rust,ignore
/// impl Filterable for Show {
///     fn field_value(&self, field: &str) -> Option<FieldValue> {
///         match field {
///             "title" => Some(self.title.as_str().into()),
///             "year" => Some(self.year.into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Filterable: Clone + Send + Sync + 'static {
    /// Plural resource name used in URLs and messages (e.g. "shows")
    fn resource_name() -> &'static str;

    /// Get the value of a specific field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;
}
