pub use crate::feedback::{AutoDismiss, Notice, NoticeId, NoticeKind, NotificationCenter};
pub use crate::form::{
    FieldBinding, FieldError, FieldKey, FieldKind, FieldLens, FieldSchema, FieldValue,
    FormController, FormError, FormModel, FormOptions, FormResult, FormValues, RevalidateMode,
    Rule, Schema, SubmissionOutcome, SubmitState, ValidationError, ValidationMode,
    ValidationResult, validate,
};
pub use crate::picker::{FileHandle, FileReadError, FileSource, ImagePicker, PreviewStatus};
pub use crate::registration::{
    FormVariant, RegistrationConfig, RegistrationController, RegistrationForm, SubmitReport,
};
pub use crate::view::{ChoiceOption, FieldView, FormView, InputKind};
