use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::controller::FieldKey;
use crate::picker::FileHandle;

/// Dynamic value of one field, as seen by schemas and presentation code.
///
/// Enum selections are carried as their tag in `Text`; the empty string is the
/// "nothing selected" sentinel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Files(Vec<FileHandle>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Files(files) => files.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Files(_) => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileHandle]> {
        match self {
            FieldValue::Files(files) => Some(files),
            FieldValue::Text(_) => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Files(_) => "files",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(value: FileHandle) -> Self {
        Self::Files(vec![value])
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FieldValueError {
    #[error("unknown form field `{0}`")]
    UnknownField(String),
    #[error("field `{field}` expects a {expected} value, got {found}")]
    KindMismatch {
        field: FieldKey,
        expected: &'static str,
        found: &'static str,
    },
}

/// Conversion between a typed model field and its dynamic [`FieldValue`].
pub trait FieldData: Sized {
    fn to_field_value(&self) -> FieldValue;
    fn from_field_value(key: FieldKey, value: FieldValue) -> Result<Self, FieldValueError>;
}

impl FieldData for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn from_field_value(key: FieldKey, value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Text(text) => Ok(text),
            other => Err(FieldValueError::KindMismatch {
                field: key,
                expected: "text",
                found: other.kind_name(),
            }),
        }
    }
}

impl FieldData for Vec<FileHandle> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Files(self.clone())
    }

    fn from_field_value(key: FieldKey, value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Files(files) => Ok(files),
            other => Err(FieldValueError::KindMismatch {
                field: key,
                expected: "files",
                found: other.kind_name(),
            }),
        }
    }
}

impl FieldData for Option<FileHandle> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Files(self.iter().cloned().collect())
    }

    fn from_field_value(key: FieldKey, value: FieldValue) -> Result<Self, FieldValueError> {
        Vec::<FileHandle>::from_field_value(key, value).map(|files| files.into_iter().next())
    }
}

/// Snapshot of every field value of a form, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<FieldKey, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<FieldKey>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.0.get(&key)
    }

    pub fn text(&self, key: FieldKey) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.0.iter()
    }
}

impl FromIterator<(FieldKey, FieldValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (FieldKey, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
