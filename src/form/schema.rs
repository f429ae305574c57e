use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use super::controller::FieldKey;
use super::rules;
use super::validation::ValidationError;
use super::value::{FieldValue, FormValues};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Phone,
    Date,
    Enum,
    File,
}

/// Tag of the constraint that produced a [`FieldError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    MaxLength,
    Pattern,
    Email,
    StrictDate,
    OneOf,
    MinFiles,
    Custom,
}

pub type FieldPredicate = Arc<dyn Fn(Option<&FieldValue>) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Check {
    Required,
    MaxLength(usize),
    Pattern(Regex),
    Email,
    StrictDate,
    OneOf(Vec<String>),
    MinFiles(usize),
    Custom(FieldPredicate),
}

impl Check {
    pub fn rule(&self) -> Rule {
        match self {
            Check::Required => Rule::Required,
            Check::MaxLength(_) => Rule::MaxLength,
            Check::Pattern(_) => Rule::Pattern,
            Check::Email => Rule::Email,
            Check::StrictDate => Rule::StrictDate,
            Check::OneOf(_) => Rule::OneOf,
            Check::MinFiles(_) => Rule::MinFiles,
            Check::Custom(_) => Rule::Custom,
        }
    }

    fn passes(&self, value: Option<&FieldValue>) -> bool {
        match self {
            Check::Required => value.is_some_and(|value| !value.is_empty()),
            Check::MinFiles(min) => value
                .and_then(FieldValue::as_files)
                .is_some_and(|files| files.len() >= *min),
            Check::Custom(predicate) => predicate(value),
            shape => {
                // Shape checks leave absence to `Required`.
                let Some(value) = value.filter(|value| !value.is_empty()) else {
                    return true;
                };
                let Some(text) = value.as_text() else {
                    return false;
                };
                match shape {
                    Check::MaxLength(max) => rules::char_len(text) <= *max,
                    Check::Pattern(pattern) => pattern.is_match(text),
                    Check::Email => rules::is_email(text),
                    Check::StrictDate => rules::is_strict_date(text),
                    Check::OneOf(allowed) => allowed.iter().any(|option| option == text),
                    Check::Required | Check::MinFiles(_) | Check::Custom(_) => true,
                }
            }
        }
    }
}

impl Debug for Check {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::Required => f.write_str("Required"),
            Check::MaxLength(max) => f.debug_tuple("MaxLength").field(max).finish(),
            Check::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            Check::Email => f.write_str("Email"),
            Check::StrictDate => f.write_str("StrictDate"),
            Check::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            Check::MinFiles(min) => f.debug_tuple("MinFiles").field(min).finish(),
            Check::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub check: Check,
    pub message: String,
}

/// Declared field: kind, label and an ordered constraint list.
///
/// Constraints are evaluated in declaration order and the first failure is
/// the one reported, so `required` goes first.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    pub name: FieldKey,
    pub label: String,
    pub kind: FieldKind,
    pub options: Vec<String>,
    pub constraints: Vec<Constraint>,
}

impl FieldSchema {
    pub fn new(name: impl Into<FieldKey>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            name,
            label: name.as_str().to_string(),
            kind,
            options: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn label(mut self, value: impl Into<String>) -> Self {
        self.label = value.into();
        self
    }

    pub fn constraint(mut self, check: Check, message: impl Into<String>) -> Self {
        self.constraints.push(Constraint {
            check,
            message: message.into(),
        });
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.constraint(Check::Required, message)
    }

    pub fn max_length(self, max: usize, message: impl Into<String>) -> Self {
        self.constraint(Check::MaxLength(max), message)
    }

    pub fn pattern(self, pattern: Regex, message: impl Into<String>) -> Self {
        self.constraint(Check::Pattern(pattern), message)
    }

    pub fn email(self, message: impl Into<String>) -> Self {
        self.constraint(Check::Email, message)
    }

    pub fn strict_date(self, message: impl Into<String>) -> Self {
        self.constraint(Check::StrictDate, message)
    }

    /// Restricts the value to `options`; the options double as the choices
    /// offered by the presentation layer.
    pub fn one_of<I, S>(mut self, options: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        let allowed = self.options.clone();
        self.constraint(Check::OneOf(allowed), message)
    }

    pub fn min_files(self, min: usize, message: impl Into<String>) -> Self {
        self.constraint(Check::MinFiles(min), message)
    }

    pub fn custom(
        self,
        predicate: impl Fn(Option<&FieldValue>) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.constraint(Check::Custom(Arc::new(predicate)), message)
    }

    pub fn is_required(&self) -> bool {
        self.constraints.iter().any(|constraint| match constraint.check {
            Check::Required => true,
            Check::MinFiles(min) => min > 0,
            _ => false,
        })
    }

    pub fn check(&self, value: Option<&FieldValue>) -> Result<(), FieldError> {
        match self
            .constraints
            .iter()
            .find(|constraint| !constraint.check.passes(value))
        {
            Some(constraint) => Err(FieldError {
                field: self.name,
                rule: constraint.check.rule(),
                message: constraint.message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field; a field with the same name replaces the earlier one.
    pub fn field(mut self, field: FieldSchema) -> Self {
        match self
            .fields
            .iter_mut()
            .find(|existing| existing.name == field.name)
        {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    pub fn validate(&self, values: &FormValues) -> ValidationResult<FieldError> {
        validate(values, self)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: FieldKey,
    pub rule: Rule,
    pub message: String,
}

impl ValidationError for FieldError {
    fn message(&self) -> String {
        self.message.clone()
    }
}

/// Outcome of one validation pass: one entry per validated field, `None`
/// when the field is valid.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationResult<E> {
    entries: BTreeMap<FieldKey, Option<E>>,
}

impl<E> ValidationResult<E> {
    pub fn is_valid(&self) -> bool {
        self.entries.values().all(Option::is_none)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn error(&self, key: FieldKey) -> Option<&E> {
        self.entries.get(&key).and_then(Option::as_ref)
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.entries
            .iter()
            .filter_map(|(key, error)| error.is_some().then_some(*key))
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, Option<&E>)> {
        self.entries.iter().map(|(key, error)| (*key, error.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: ValidationError> ValidationResult<E> {
    pub fn message(&self, key: FieldKey) -> Option<String> {
        self.error(key).map(ValidationError::message)
    }
}

impl<E> FromIterator<(FieldKey, Option<E>)> for ValidationResult<E> {
    fn from_iter<I: IntoIterator<Item = (FieldKey, Option<E>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Runs every field of `schema` against `values`. Fields are independent; a
/// missing value is treated as empty.
pub fn validate(values: &FormValues, schema: &Schema) -> ValidationResult<FieldError> {
    schema
        .fields()
        .iter()
        .map(|field| (field.name, field.check(values.get(field.name)).err()))
        .collect()
}
