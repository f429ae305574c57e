pub mod feedback;
pub mod form;
pub mod picker;
pub mod prelude;
pub mod registration;
pub mod view;

pub use feedback::{Notice, NoticeId, NoticeKind, NotificationCenter};
pub use form::{FormController, FormError, FormResult, Schema, ValidationResult, validate};
pub use picker::{FileHandle, ImagePicker, PreviewStatus, PreviewTask};
pub use registration::{
    ConfigError, FormVariant, RegistrationConfig, RegistrationController, RegistrationForm,
    SubmitReport,
};
pub use view::{FieldView, FormView, InputKind};
