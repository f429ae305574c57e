use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use super::schema::ValidationResult;
use super::validation::{FormModel, ValidationError};
use super::value::{FieldValue, FieldValueError};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        Self(value)
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(pub u64);

/// Submit lifecycle. `Invalid` is a resting state like `Idle` that keeps the
/// last errors visible; both accept a new submit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    Idle,
    Validating,
    Invalid,
    Submitting,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

/// When a field is validated again once the form has been submitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevalidateMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub revalidate_mode: RevalidateMode,
    pub validate_first_error_only: bool,
    pub reset_on_success: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::OnSubmit,
            revalidate_mode: RevalidateMode::OnSubmit,
            validate_first_error_only: true,
            reset_on_success: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMeta<E> {
    pub dirty: bool,
    pub touched: bool,
    pub errors: Vec<E>,
}

impl<E> Default for FieldMeta<E> {
    fn default() -> Self {
        Self {
            dirty: false,
            touched: false,
            errors: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T, E> {
    pub model: T,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub field_meta: BTreeMap<FieldKey, FieldMeta<E>>,
}

/// Result of one submit attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome<T, E> {
    /// Every field passed; `values` is the normalized model handed to the
    /// submit handler.
    Accepted { values: T },
    /// At least one field failed; the form keeps its values.
    Rejected { errors: ValidationResult<E> },
}

impl<T, E> SubmissionOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }

    pub fn values(&self) -> Option<&T> {
        match self {
            SubmissionOutcome::Accepted { values } => Some(values),
            SubmissionOutcome::Rejected { .. } => None,
        }
    }

    pub fn errors(&self) -> Option<&ValidationResult<E>> {
        match self {
            SubmissionOutcome::Rejected { errors } => Some(errors),
            SubmissionOutcome::Accepted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("form is hosted in a closed dialog")]
    DialogClosed,
    #[error(transparent)]
    Value(#[from] FieldValueError),
    #[error("submit handler failed: {0}")]
    Handler(String),
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type SyncFieldValidatorFn<T, E> = Arc<dyn Fn(&T) -> Result<(), E> + Send + Sync>;
pub(super) type NormalizerFn<T> = Arc<dyn Fn(&mut T) + Send + Sync>;
pub(super) type ChangeListener = Arc<dyn Fn(&FieldValue) + Send + Sync>;

pub(super) struct FormState<T, E> {
    pub(super) id: FormId,
    pub(super) initial_model: T,
    pub(super) model: T,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) dirty_fields: BTreeSet<FieldKey>,
    pub(super) field_meta: BTreeMap<FieldKey, FieldMeta<E>>,
}

impl<T, E> FormState<T, E> {
    pub(super) fn ensure_meta(&mut self, key: FieldKey) -> &mut FieldMeta<E> {
        self.field_meta.entry(key).or_default()
    }
}

/// Form state store: the typed model, per-field metadata, validators and the
/// submit state machine. Clones share the same form instance.
#[derive(Clone)]
pub struct FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState<T, E>>>,
    pub(super) sync_field_validators:
        Arc<RwLock<BTreeMap<FieldKey, Vec<SyncFieldValidatorFn<T, E>>>>>,
    pub(super) normalizers: Arc<RwLock<Vec<NormalizerFn<T>>>>,
    pub(super) listeners: Arc<RwLock<BTreeMap<FieldKey, Vec<(SubscriptionId, ChangeListener)>>>>,
    pub(super) next_subscription: Arc<AtomicU64>,
    pub(super) required_fields: Arc<RwLock<BTreeSet<FieldKey>>>,
    pub(super) field_descriptions: Arc<RwLock<BTreeMap<FieldKey, String>>>,
}

impl<T, E> FormController<T, E>
where
    T: FormModel,
    E: ValidationError,
{
    pub fn new(initial: T, options: FormOptions) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial_model: initial.clone(),
                model: initial,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                dirty_fields: BTreeSet::new(),
                field_meta: BTreeMap::new(),
            })),
            sync_field_validators: Arc::new(RwLock::new(BTreeMap::new())),
            normalizers: Arc::new(RwLock::new(Vec::new())),
            listeners: Arc::new(RwLock::new(BTreeMap::new())),
            next_subscription: Arc::new(AtomicU64::new(0)),
            required_fields: Arc::new(RwLock::new(BTreeSet::new())),
            field_descriptions: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn register_field_description<L>(
        &self,
        lens: L,
        description: impl Into<String>,
    ) -> FormResult<()>
    where
        L: super::validation::FieldLens<T>,
    {
        let mut descriptions =
            write_lock(&self.field_descriptions, "registering field description")?;
        descriptions.insert(lens.key(), description.into());
        Ok(())
    }

    /// Listens for committed changes of one field. Listeners run after the
    /// store lock is released.
    pub fn subscribe(
        &self,
        name: &str,
        listener: impl Fn(&FieldValue) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        let key = Self::resolve_key(name)?;
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst) + 1);
        write_lock(&self.listeners, "subscribing to field changes")?
            .entry(key)
            .or_default()
            .push((id, Arc::new(listener)));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        let mut listeners = write_lock(&self.listeners, "unsubscribing from field changes")?;
        for entries in listeners.values_mut() {
            if let Some(index) = entries.iter().position(|(candidate, _)| *candidate == id) {
                entries.remove(index);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Validates, normalizes and hands the model to `f`.
    ///
    /// Invalid forms keep their values and resolve to
    /// [`SubmissionOutcome::Rejected`]; `f` is only called for valid forms.
    /// After `f` succeeds the form is reset when
    /// [`FormOptions::reset_on_success`] is set.
    pub fn submit(
        &self,
        f: impl FnOnce(&T) -> FormResult<()>,
    ) -> FormResult<SubmissionOutcome<T, E>> {
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submit_state == SubmitState::Submitting {
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
        }

        if !self.validate_form()? {
            let errors = self.validation_result()?;
            let mut state = write_lock(&self.state, "handling submit validation failure")?;
            transition_submit_state(&mut state, SubmitState::Invalid)?;
            return Ok(SubmissionOutcome::Rejected { errors });
        }

        let mut model = {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.model.clone()
        };
        for normalizer in read_lock(&self.normalizers, "reading submit normalizers")?.iter() {
            normalizer(&mut model);
        }

        if let Err(error) = f(&model) {
            let mut state = write_lock(&self.state, "handling submit handler failure")?;
            transition_submit_state(&mut state, SubmitState::Idle)?;
            return Err(error);
        }

        if self.options.reset_on_success {
            self.reset_to_initial()?;
        } else {
            let mut state = write_lock(&self.state, "completing submit")?;
            transition_submit_state(&mut state, SubmitState::Idle)?;
        }
        Ok(SubmissionOutcome::Accepted { values: model })
    }

    pub fn reset_to_initial(&self) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "resetting form")?;
            state.model = state.initial_model.clone();
            transition_submit_state(&mut state, SubmitState::Idle)?;
            state.submit_count = 0;
            state.dirty_fields.clear();
            for meta in state.field_meta.values_mut() {
                meta.dirty = false;
                meta.touched = false;
                meta.errors.clear();
            }
        }
        let keys = read_lock(&self.listeners, "reading listened field keys")?
            .keys()
            .copied()
            .collect::<Vec<_>>();
        for key in keys {
            self.notify_listeners(key)?;
        }
        Ok(())
    }

    pub fn reset_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: super::validation::FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "resetting field")?;
            let initial_value = lens.get(&state.initial_model).clone();
            lens.set(&mut state.model, initial_value);
            state.dirty_fields.remove(&key);
            let meta = state.ensure_meta(key);
            meta.dirty = false;
            meta.touched = false;
            meta.errors.clear();
        }
        self.notify_listeners(key)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T, E>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        let is_valid = state.field_meta.values().all(|meta| meta.errors.is_empty());
        Ok(FormSnapshot {
            model: state.model.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            is_dirty: !state.dirty_fields.is_empty(),
            is_valid,
            field_meta: state.field_meta.clone(),
        })
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn field_meta<L>(&self, lens: L) -> FormResult<Option<FieldMeta<E>>>
    where
        L: super::validation::FieldLens<T>,
    {
        self.field_meta_by_key(lens.key())
    }

    pub fn field_description_by_key(&self, key: FieldKey) -> FormResult<Option<String>> {
        Ok(
            read_lock(&self.field_descriptions, "reading field description")?
                .get(&key)
                .cloned(),
        )
    }

    pub fn is_required_key(&self, key: FieldKey) -> FormResult<bool> {
        Ok(read_lock(&self.required_fields, "reading required fields")?.contains(&key))
    }

    /// Error message to show for a field: the first error, once the field
    /// has been touched or a submit was attempted.
    pub fn display_error_message(&self, key: FieldKey) -> FormResult<Option<String>> {
        let state = read_lock(&self.state, "reading display error message")?;
        let Some(meta) = state.field_meta.get(&key) else {
            return Ok(None);
        };
        if !meta.touched && state.submit_count == 0 {
            return Ok(None);
        }
        Ok(meta.errors.first().map(ValidationError::message))
    }

    pub(super) fn field_meta_by_key(&self, key: FieldKey) -> FormResult<Option<FieldMeta<E>>> {
        Ok(read_lock(&self.state, "reading field meta")?
            .field_meta
            .get(&key)
            .cloned())
    }

    pub(super) fn resolve_key(name: &str) -> FormResult<FieldKey> {
        T::FIELD_KEYS
            .iter()
            .find(|key| key.as_str() == name)
            .copied()
            .ok_or_else(|| FieldValueError::UnknownField(name.to_string()).into())
    }

    pub(super) fn notify_listeners(&self, key: FieldKey) -> FormResult<()> {
        let listeners = read_lock(&self.listeners, "reading field listeners")?
            .get(&key)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if listeners.is_empty() {
            return Ok(());
        }
        let Some(value) = read_lock(&self.state, "reading changed value")?
            .model
            .field_value(key)
        else {
            return Ok(());
        };
        for listener in listeners {
            listener(&value);
        }
        Ok(())
    }
}

pub(super) fn transition_submit_state<T, E>(
    state: &mut FormState<T, E>,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Invalid, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Invalid)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    debug!(form = state.id.0, from = ?current, to = ?next, "submit state transition");
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
