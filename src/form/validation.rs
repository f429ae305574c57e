use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::controller::{
    FieldKey, FormController, FormResult, NormalizerFn, RevalidateMode, SyncFieldValidatorFn,
    ValidationMode, read_lock, write_lock,
};
use super::schema::{FieldError, Schema, ValidationResult};
use super::value::{FieldValue, FieldValueError, FormValues};

pub trait ValidationError: Clone + Send + Sync + 'static {
    fn message(&self) -> String;
}

pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

/// A form model whose fields are addressable both through typed lenses and
/// by key. Usually derived with `#[derive(FormModel)]`.
pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    const FIELD_KEYS: &'static [FieldKey];

    fn fields() -> Self::Fields;
    fn field_value(&self, key: FieldKey) -> Option<FieldValue>;
    fn set_field_value(&mut self, key: FieldKey, value: FieldValue) -> Result<(), FieldValueError>;

    fn values(&self) -> FormValues {
        Self::FIELD_KEYS
            .iter()
            .filter_map(|key| self.field_value(*key).map(|value| (*key, value)))
            .collect()
    }
}

pub trait FieldValidator<T, L, E>: Send + Sync
where
    L: FieldLens<T>,
    E: ValidationError,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), E>;
}

impl<T, L, E, F> FieldValidator<T, L, E> for F
where
    L: FieldLens<T>,
    E: ValidationError,
    F: for<'a> Fn(&'a T, &'a L::Value) -> Result<(), E> + Send + Sync,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), E> {
        (self)(model, value)
    }
}

impl<T, E> FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub fn register_field_validator<L, V>(&self, lens: L, validator: V) -> FormResult<()>
    where
        L: FieldLens<T>,
        V: FieldValidator<T, L, E> + 'static,
    {
        let key = lens.key();
        let validator = Arc::new(validator);
        let wrapped: SyncFieldValidatorFn<T, E> =
            Arc::new(move |model: &T| validator.validate(model, lens.get(model)));
        let mut validators =
            write_lock(&self.sync_field_validators, "registering field validator")?;
        validators.entry(key).or_default().push(wrapped);
        Ok(())
    }

    /// Registers one validator per schema field, ahead of any validator
    /// already registered for that field, and marks required fields.
    pub fn register_schema(&self, schema: &Schema) -> FormResult<()>
    where
        E: From<FieldError>,
    {
        let mut validators = write_lock(&self.sync_field_validators, "registering schema")?;
        let mut required = write_lock(&self.required_fields, "registering schema requirements")?;
        for field in schema.fields() {
            let key = field.name;
            if field.is_required() {
                required.insert(key);
            }
            let field = Arc::new(field.clone());
            let wrapped: SyncFieldValidatorFn<T, E> = Arc::new(move |model: &T| {
                field
                    .check(model.field_value(field.name).as_ref())
                    .map_err(E::from)
            });
            validators.entry(key).or_default().insert(0, wrapped);
        }
        Ok(())
    }

    /// Adds a transform applied to the submitted copy of the model before it
    /// reaches the submit handler. The stored model is not changed.
    pub fn register_normalizer<L, F>(&self, lens: L, normalize: F) -> FormResult<()>
    where
        L: FieldLens<T>,
        F: Fn(&L::Value) -> L::Value + Send + Sync + 'static,
    {
        let wrapped: NormalizerFn<T> = Arc::new(move |model: &mut T| {
            let next = normalize(lens.get(model));
            lens.set(model, next);
        });
        write_lock(&self.normalizers, "registering normalizer")?.push(wrapped);
        Ok(())
    }

    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "writing form model")?;
            lens.set(&mut state.model, value);
            let is_dirty = lens.get(&state.model) != lens.get(&state.initial_model);
            mark_dirty(&mut state, key, is_dirty);
        }
        self.after_change(key)
    }

    /// Key-based counterpart of [`FormController::set`].
    pub fn set_value(&self, name: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        let key = Self::resolve_key(name)?;
        {
            let mut state = write_lock(&self.state, "writing form value")?;
            state.model.set_field_value(key, value.into())?;
            let is_dirty = state.model.field_value(key) != state.initial_model.field_value(key);
            mark_dirty(&mut state, key, is_dirty);
        }
        self.after_change(key)
    }

    pub fn value(&self, name: &str) -> FormResult<FieldValue> {
        let key = Self::resolve_key(name)?;
        read_lock(&self.state, "reading form value")?
            .model
            .field_value(key)
            .ok_or_else(|| FieldValueError::UnknownField(name.to_string()).into())
    }

    pub fn get_values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?.model.values())
    }

    pub fn touch<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        self.touch_key(lens.key())
    }

    pub(super) fn touch_key(&self, key: FieldKey) -> FormResult<()> {
        let submitted = {
            let mut state = write_lock(&self.state, "touching field")?;
            state.ensure_meta(key).touched = true;
            state.submit_count > 0
        };

        let revalidate = submitted && self.options.revalidate_mode == RevalidateMode::OnBlur;
        if self.options.validate_mode == ValidationMode::OnBlur || revalidate {
            let _ = self.validate_field_by_key(key)?;
        }
        Ok(())
    }

    pub fn validate_field<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        self.validate_field_by_key(lens.key())
    }

    /// Runs every registered validator and replaces all field errors.
    pub fn validate_form(&self) -> FormResult<bool> {
        let model = {
            read_lock(&self.state, "reading model for form validation")?
                .model
                .clone()
        };
        let field_validators = read_lock(
            &self.sync_field_validators,
            "reading field validators for form validation",
        )?
        .clone();

        let mut field_errors = BTreeMap::<FieldKey, Vec<E>>::new();
        for (key, validators) in field_validators {
            field_errors.insert(key, self.run_validators(&model, &validators));
        }

        {
            let mut state = write_lock(&self.state, "applying form validation result")?;
            let mut keys = state
                .field_meta
                .keys()
                .copied()
                .collect::<BTreeSet<FieldKey>>();
            keys.extend(field_errors.keys().copied());
            for key in keys {
                state.ensure_meta(key).errors = field_errors.remove(&key).unwrap_or_default();
            }
        }

        Ok(self.snapshot()?.is_valid)
    }

    /// Latest errors of every field that has validators, one entry per field.
    pub fn validation_result(&self) -> FormResult<ValidationResult<E>> {
        let keys = read_lock(&self.sync_field_validators, "reading validated field keys")?
            .keys()
            .copied()
            .collect::<Vec<_>>();
        let state = read_lock(&self.state, "reading validation result")?;
        Ok(keys
            .into_iter()
            .map(|key| {
                let error = state
                    .field_meta
                    .get(&key)
                    .and_then(|meta| meta.errors.first().cloned());
                (key, error)
            })
            .collect())
    }

    pub(super) fn validate_field_by_key(&self, key: FieldKey) -> FormResult<bool> {
        let model = {
            read_lock(&self.state, "reading model for field validation")?
                .model
                .clone()
        };
        let validators = {
            read_lock(
                &self.sync_field_validators,
                "reading field validators for key validation",
            )?
            .get(&key)
            .cloned()
            .unwrap_or_default()
        };

        let errors = self.run_validators(&model, &validators);
        let valid = errors.is_empty();
        let mut state = write_lock(&self.state, "writing field validation result")?;
        state.ensure_meta(key).errors = errors;
        Ok(valid)
    }

    fn run_validators(&self, model: &T, validators: &[SyncFieldValidatorFn<T, E>]) -> Vec<E> {
        let mut errors = Vec::new();
        for validator in validators {
            if let Err(error) = validator(model) {
                errors.push(error);
                if self.options.validate_first_error_only {
                    break;
                }
            }
        }
        errors
    }

    fn after_change(&self, key: FieldKey) -> FormResult<()> {
        let submitted = read_lock(&self.state, "reading submit count")?.submit_count > 0;
        let revalidate = submitted && self.options.revalidate_mode == RevalidateMode::OnChange;
        if self.options.validate_mode == ValidationMode::OnChange || revalidate {
            let _ = self.validate_field_by_key(key)?;
        }
        self.notify_listeners(key)
    }
}

fn mark_dirty<T, E>(state: &mut super::controller::FormState<T, E>, key: FieldKey, is_dirty: bool) {
    if is_dirty {
        state.dirty_fields.insert(key);
    } else {
        state.dirty_fields.remove(&key);
    }
    state.ensure_meta(key).dirty = is_dirty;
}
