use serde::Serialize;

use crate::feedback::Notice;
use crate::form::{
    FieldBinding, FieldKey, FieldKind, FieldSchema, FieldValue, FormModel, FormResult,
    SubmitState, ValidationError,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Email,
    Password,
    Phone,
    Date,
    Radio,
    Select,
    File,
}

impl InputKind {
    pub fn for_field(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => InputKind::Text,
            FieldKind::Email => InputKind::Email,
            FieldKind::Password => InputKind::Password,
            FieldKind::Phone => InputKind::Phone,
            FieldKind::Date => InputKind::Date,
            FieldKind::Enum => InputKind::Select,
            FieldKind::File => InputKind::File,
        }
    }

    /// `type` attribute for toolkits backed by HTML inputs. Email stays a
    /// plain text input so the form's own validation is the only one.
    pub fn html_type(self) -> &'static str {
        match self {
            InputKind::Text | InputKind::Email | InputKind::Select => "text",
            InputKind::Password => "password",
            InputKind::Phone => "tel",
            InputKind::Date => "date",
            InputKind::Radio => "radio",
            InputKind::File => "file",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label is the value with its first letter capitalized.
    pub fn titled(value: impl Into<String>) -> Self {
        let value = value.into();
        let mut chars = value.chars();
        let label = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self { value, label }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldView {
    pub key: FieldKey,
    pub label: String,
    pub input: InputKind,
    pub value: FieldValue,
    pub required: bool,
    pub description: Option<String>,
    pub error: Option<String>,
    pub options: Vec<ChoiceOption>,
    pub accept: Option<String>,
}

impl FieldView {
    pub fn build<T, E>(
        binding: &FieldBinding<T, E>,
        schema: &FieldSchema,
        input: InputKind,
    ) -> FormResult<Self>
    where
        T: FormModel,
        E: ValidationError,
    {
        let mut options = Vec::new();
        if input == InputKind::Select {
            options.push(ChoiceOption::new("", format!("Select a {}", schema.label)));
        }
        options.extend(schema.options.iter().map(ChoiceOption::titled));

        Ok(Self {
            key: binding.key(),
            label: schema.label.clone(),
            input,
            value: binding.value()?,
            required: binding.is_required()?,
            description: binding.description()?,
            error: binding.error()?,
            options,
            accept: None,
        })
    }

    pub fn accept(mut self, value: impl Into<String>) -> Self {
        self.accept = Some(value.into());
        self
    }

    pub fn invalid(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DialogView {
    pub title: String,
    pub open: bool,
}

/// Everything a toolkit needs to draw one form instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormView {
    pub title: String,
    pub fields: Vec<FieldView>,
    /// Always set: the toolkit must not run its own required-field checks.
    pub no_validate: bool,
    pub submit_state: SubmitState,
    pub selected_file: Option<String>,
    pub preview: Option<String>,
    pub notice: Option<Notice>,
    pub dialog: Option<DialogView>,
}

impl FormView {
    pub fn field(&self, key: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.key.as_str() == key)
    }

    pub fn errors(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.fields
            .iter()
            .filter_map(|field| field.error.as_deref().map(|error| (field.key, error)))
    }
}
