use regex::Regex;
use serde::{Deserialize, Serialize};

use super::config::{ConfigError, RegistrationConfig};
use crate::form::{FieldKind, FieldSchema, Schema};

pub const USERNAME: &str = "username";
pub const EMAIL: &str = "email";
pub const PASSWORD: &str = "password";
pub const MOBILE: &str = "mobilenumber";
pub const DATE: &str = "selectedDate";
pub const GENDER: &str = "gender";
pub const DISTRICT: &str = "district";
pub const FILES: &str = "files";

/// The four flavours of the registration form. They share one model and
/// differ in date strictness, the file requirement and whether a dialog
/// hosts the form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
    Plain,
    Modal,
    Typed,
    Zod,
}

impl FormVariant {
    pub const ALL: [FormVariant; 4] = [Self::Plain, Self::Modal, Self::Typed, Self::Zod];

    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "registration",
            Self::Modal => "registration_modal",
            Self::Typed => "registration_typed",
            Self::Zod => "registration_zod",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Modal => "Registration Form in Modal",
            _ => "Registration Form",
        }
    }

    pub fn strict_date(self) -> bool {
        !matches!(self, Self::Modal)
    }

    pub fn requires_file(self) -> bool {
        matches!(self, Self::Plain | Self::Modal)
    }

    pub fn in_dialog(self) -> bool {
        matches!(self, Self::Modal)
    }
}

/// Builds the validation schema of `variant`. Fields come out in display
/// order; variants without a file rule still declare the file input, just
/// without constraints.
pub fn registration_schema(
    variant: FormVariant,
    config: &RegistrationConfig,
) -> Result<Schema, ConfigError> {
    config.check()?;
    let mobile = Regex::new(&format!("^[0-9]{{{}}}$", config.mobile_digits))?;

    let mut date = FieldSchema::new(DATE, FieldKind::Date)
        .label("Date")
        .required("Date is required");
    if variant.strict_date() {
        date = date.strict_date("Invalid date format");
    }

    let mut files = FieldSchema::new(FILES, FieldKind::File).label("Select Image");
    if variant.requires_file() {
        files = files.min_files(1, "Please select a file");
    }

    Ok(Schema::new(variant.name())
        .field(
            FieldSchema::new(USERNAME, FieldKind::Text)
                .label("Username")
                .required("Username is required")
                .max_length(
                    config.username_max_len,
                    format!(
                        "Username must be at most {} characters",
                        config.username_max_len
                    ),
                ),
        )
        .field(
            FieldSchema::new(EMAIL, FieldKind::Email)
                .label("Email")
                .required("Email is required")
                .email("Invalid email format"),
        )
        .field(
            FieldSchema::new(PASSWORD, FieldKind::Password)
                .label("Password")
                .required("Password is required")
                .max_length(
                    config.password_max_len,
                    format!(
                        "Password must be at most {} characters",
                        config.password_max_len
                    ),
                ),
        )
        .field(
            FieldSchema::new(MOBILE, FieldKind::Phone)
                .label("Phone")
                .required("Mobile number is required")
                .pattern(
                    mobile,
                    format!("Mobile number must be {} digits", config.mobile_digits),
                ),
        )
        .field(date)
        .field(
            FieldSchema::new(GENDER, FieldKind::Enum)
                .label("Gender")
                .required("Gender is required")
                .one_of(config.genders.iter().cloned(), "Please select a valid gender"),
        )
        .field(
            FieldSchema::new(DISTRICT, FieldKind::Enum)
                .label("District")
                .required("District is required")
                .one_of(
                    config.districts.iter().cloned(),
                    "Please select a valid district",
                ),
        )
        .field(files))
}
