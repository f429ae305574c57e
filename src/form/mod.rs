mod binding;
mod controller;
pub mod rules;
mod schema;
mod validation;
mod value;


pub use binding::FieldBinding;
pub use controller::{
    FieldKey, FieldMeta, FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot,
    RevalidateMode, SubmissionOutcome, SubmitState, SubscriptionId, ValidationMode,
};
pub use regform_derive::FormModel;
pub use schema::{
    Check, Constraint, FieldError, FieldKind, FieldPredicate, FieldSchema, Rule, Schema,
    ValidationResult, validate,
};
pub use validation::{FieldLens, FieldValidator, FormModel, ValidationError};
pub use value::{FieldData, FieldValue, FieldValueError, FormValues};
