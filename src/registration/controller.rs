use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::config::{ConfigError, RegistrationConfig};
use super::model::RegistrationForm;
use super::schema::{FILES, FormVariant, GENDER, registration_schema};
use crate::feedback::{AutoDismiss, Notice, NoticeId, NotificationCenter};
use crate::form::{
    FieldBinding, FieldError, FieldKind, FieldValue, FormController, FormError, FormModel,
    FormResult, Schema, SubmissionOutcome, rules,
};
use crate::picker::{FileHandle, ImagePicker, PreviewTask};
use crate::view::{DialogView, FieldView, FormView, InputKind};

pub type RegistrationStore = FormController<RegistrationForm, FieldError>;

/// What one submit attempt produced.
///
/// `preview` and `auto_dismiss` are futures for the UI executor. Dropping
/// `preview` unfinished abandons that read; dropping `auto_dismiss` leaves
/// the notice up until it is dismissed.
#[must_use]
pub struct SubmitReport {
    pub outcome: SubmissionOutcome<RegistrationForm, FieldError>,
    pub preview: Option<PreviewTask>,
    pub notice: Option<NoticeId>,
    pub auto_dismiss: Option<AutoDismiss>,
}

impl SubmitReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// One registration form instance: store, image picker, notices and, for the
/// modal variant, the hosting dialog.
#[derive(Clone)]
pub struct RegistrationController {
    variant: FormVariant,
    config: Arc<RegistrationConfig>,
    schema: Arc<Schema>,
    store: RegistrationStore,
    picker: ImagePicker,
    notices: NotificationCenter,
    dialog_open: Arc<AtomicBool>,
}

impl RegistrationController {
    pub fn new(variant: FormVariant) -> Result<Self, ConfigError> {
        Self::with_config(variant, RegistrationConfig::default())
    }

    pub fn with_config(
        variant: FormVariant,
        config: RegistrationConfig,
    ) -> Result<Self, ConfigError> {
        let schema = registration_schema(variant, &config)?;
        let store = RegistrationStore::new(RegistrationForm::default(), config.form);
        store.register_schema(&schema)?;
        let fields = RegistrationForm::fields();
        store.register_normalizer(fields.selected_date(), |value: &String| {
            rules::normalize_date(value)
        })?;
        store.register_field_description(
            fields.files(),
            format!("Accepted: {}", config.accept.join(", ")),
        )?;

        debug!(form = variant.name(), "registration form created");
        Ok(Self {
            variant,
            picker: ImagePicker::new(config.accept.iter().cloned()),
            config: Arc::new(config),
            schema: Arc::new(schema),
            store,
            notices: NotificationCenter::default(),
            dialog_open: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &RegistrationStore {
        &self.store
    }

    pub fn picker(&self) -> &ImagePicker {
        &self.picker
    }

    pub fn notices(&self) -> &NotificationCenter {
        &self.notices
    }

    pub fn register(&self, name: &str) -> FormResult<FieldBinding<RegistrationForm, FieldError>> {
        self.store.register(name)
    }

    pub fn set_value(&self, name: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        self.store.set_value(name, value)
    }

    /// Stores the chosen file (or clears it) and starts its preview.
    pub fn select_file(&self, file: Option<FileHandle>) -> FormResult<Option<PreviewTask>> {
        let files = file.iter().cloned().collect::<Vec<_>>();
        self.store.set_value(FILES, FieldValue::Files(files))?;
        Ok(self.picker.select(file))
    }

    /// Validates and, when valid, hands the normalized payload off.
    ///
    /// On success the store resets, the picker forgets the file while its
    /// preview keeps resolving, and a success notice is shown. On failure
    /// nothing changes apart from the errors becoming visible.
    pub fn submit(&self) -> FormResult<SubmitReport> {
        if self.variant.in_dialog() && !self.is_dialog_open() {
            return Err(FormError::DialogClosed);
        }

        let form = self.variant.name();
        let outcome = self.store.submit(|values| {
            let payload =
                serde_json::to_string(values).map_err(|error| FormError::Handler(error.to_string()))?;
            info!(form, %payload, "registration submitted");
            Ok(())
        })?;

        let SubmissionOutcome::Accepted { values } = &outcome else {
            if let Some(errors) = outcome.errors() {
                debug!(form, invalid = errors.invalid_fields().count(), "registration rejected");
            }
            return Ok(SubmitReport {
                outcome,
                preview: None,
                notice: None,
                auto_dismiss: None,
            });
        };

        let preview = values.file().and_then(|file| self.picker.preview_file(file));
        self.picker.release_selection();
        let notice = self.notices.show(
            Notice::success(self.config.success_message.clone())
                .auto_hide(Some(self.config.notice_auto_hide())),
        );
        let auto_dismiss = self.notices.auto_dismiss(notice);

        Ok(SubmitReport {
            outcome,
            preview,
            notice: Some(notice),
            auto_dismiss,
        })
    }

    /// Clears values, errors, the picked file and its preview.
    pub fn reset(&self) -> FormResult<()> {
        self.store.reset_to_initial()?;
        self.picker.reset();
        Ok(())
    }

    pub fn open_dialog(&self) {
        self.dialog_open.store(true, Ordering::SeqCst);
    }

    /// Hides the dialog; entered values are kept for the next opening.
    pub fn close_dialog(&self) {
        self.dialog_open.store(false, Ordering::SeqCst);
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open.load(Ordering::SeqCst)
    }

    pub fn dismiss_notice(&self, id: NoticeId) -> bool {
        self.notices.dismiss(id)
    }

    pub fn view(&self) -> FormResult<FormView> {
        let mut fields = Vec::with_capacity(self.schema.fields().len());
        for field in self.schema.fields() {
            let binding = self.store.register(field.name.as_str())?;
            let input = match field.kind {
                FieldKind::Enum if field.name.as_str() == GENDER => InputKind::Radio,
                kind => InputKind::for_field(kind),
            };
            let mut view = FieldView::build(&binding, field, input)?;
            if input == InputKind::File {
                view = view.accept(self.picker.accept());
            }
            fields.push(view);
        }

        Ok(FormView {
            title: self.variant.title().to_string(),
            fields,
            no_validate: true,
            submit_state: self.store.submit_state()?,
            selected_file: self
                .picker
                .selection()
                .map(|selection| selection.display_name),
            preview: self.picker.preview_data_uri(),
            notice: self.notices.current(),
            dialog: self.variant.in_dialog().then(|| DialogView {
                title: self.variant.title().to_string(),
                open: self.is_dialog_open(),
            }),
        })
    }
}
