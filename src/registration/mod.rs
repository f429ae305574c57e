//! The registration form: one model, four variant schemas and the controller
//! that wires the form store, image picker and notices together.

mod config;
mod controller;
mod model;
mod schema;


pub use config::{ConfigError, RegistrationConfig};
pub use controller::{RegistrationController, RegistrationStore, SubmitReport};
pub use model::{RegistrationForm, RegistrationFormFields};
pub use schema::{
    DATE, DISTRICT, EMAIL, FILES, FormVariant, GENDER, MOBILE, PASSWORD, USERNAME,
    registration_schema,
};
