use super::controller::{FieldKey, FormController, FormResult, SubscriptionId};
use super::validation::{FormModel, ValidationError};
use super::value::FieldValue;

/// Glue between one form field and an input widget: current value, change
/// and blur handlers, and the error the widget should display.
#[derive(Clone)]
pub struct FieldBinding<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    controller: FormController<T, E>,
    key: FieldKey,
}

impl<T, E> FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub fn register(&self, name: &str) -> FormResult<FieldBinding<T, E>> {
        Ok(FieldBinding {
            controller: self.clone(),
            key: Self::resolve_key(name)?,
        })
    }

    pub fn bindings(&self) -> Vec<FieldBinding<T, E>> {
        T::FIELD_KEYS
            .iter()
            .map(|key| FieldBinding {
                controller: self.clone(),
                key: *key,
            })
            .collect()
    }
}

impl<T, E> FieldBinding<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn value(&self) -> FormResult<FieldValue> {
        self.controller.value(self.key.as_str())
    }

    pub fn set(&self, value: impl Into<FieldValue>) -> FormResult<()> {
        self.controller.set_value(self.key.as_str(), value)
    }

    pub fn touch(&self) -> FormResult<()> {
        self.controller.touch_key(self.key)
    }

    pub fn error(&self) -> FormResult<Option<String>> {
        self.controller.display_error_message(self.key)
    }

    pub fn is_dirty(&self) -> FormResult<bool> {
        Ok(self
            .controller
            .field_meta_by_key(self.key)?
            .is_some_and(|meta| meta.dirty))
    }

    pub fn is_required(&self) -> FormResult<bool> {
        self.controller.is_required_key(self.key)
    }

    pub fn description(&self) -> FormResult<Option<String>> {
        self.controller.field_description_by_key(self.key)
    }

    pub fn on_change(
        &self,
        listener: impl Fn(&FieldValue) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        self.controller.subscribe(self.key.as_str(), listener)
    }
}
