use serde::{Serialize, Serializer};

use crate::form::FormModel;
use crate::picker::FileHandle;

/// Values of one registration form instance.
///
/// `Serialize` produces the submission payload; the password is masked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, FormModel)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "mask")]
    pub password: String,
    pub mobilenumber: String,
    #[form(rename = "selectedDate")]
    #[serde(rename = "selectedDate")]
    pub selected_date: String,
    pub gender: String,
    pub district: String,
    pub files: Vec<FileHandle>,
}

impl RegistrationForm {
    pub fn file(&self) -> Option<&FileHandle> {
        self.files.first()
    }
}

fn mask<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&"*".repeat(value.chars().count()))
}
