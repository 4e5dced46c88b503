//! Document model shared by the bulk writer and the collections.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identity field carried by stored documents.
pub const ID_FIELD: &str = "_id";

/// A document: an ordered mapping of field name to JSON value.
///
/// A document carrying [`ID_FIELD`] is written as an update; one without it is a
/// pending insert. A pending insert may name its own unique attribute, which takes
/// precedence over the writer-wide default when the writer looks for an existing
/// copy of the document in the store. The override is not part of the stored body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
    #[serde(skip)]
    unique_attr: Option<String>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Document {
            fields,
            unique_attr: None,
        }
    }

    /// Converts a JSON value into a document.
    ///
    /// Returns the value back unchanged when it is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(fields) => Ok(Self::from_map(fields)),
            other => Err(other),
        }
    }

    /// Sets the per-document unique attribute override.
    pub fn with_unique_attr(mut self, attr: impl Into<String>) -> Self {
        self.unique_attr = Some(attr.into());
        self
    }

    /// The per-document unique attribute override, if any.
    pub fn unique_attr(&self) -> Option<&str> {
        self.unique_attr.as_deref()
    }

    /// The identity value, if the document carries one.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(ID_FIELD)
    }

    /// Returns `true` when the document carries an identity.
    pub fn has_id(&self) -> bool {
        self.fields.contains_key(ID_FIELD)
    }

    /// Attaches an identity value, replacing any previous one.
    pub fn set_id(&mut self, id: Value) {
        self.fields.insert(ID_FIELD.to_string(), id);
    }

    /// Value of a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// The fields in insertion order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the document, returning its body.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document::from_map(fields)
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.fields) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("<unprintable document>"),
        }
    }
}

/// Query filter understood by a document collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches documents whose `field` equals one of `values`.
    In {
        /// Field to match on
        field: String,
        /// Accepted values
        values: Vec<Value>,
    },
}

impl Filter {
    /// Shorthand for [`Filter::In`].
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.into(),
            values,
        }
    }
}
