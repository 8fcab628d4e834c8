//! Student record model.
//!
//! A [`Student`] is the only entity the service manages. Identifiers are
//! opaque strings at this level; each storage adapter parses them under its
//! own scheme (ObjectId hex, auto-increment integers, cache keys).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::password::{self, PasswordError};

/// Validation errors raised by [`Student`] and [`StudentId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    EmptyId,
    MissingId,
    MissingRollNo,
    PasswordSealing { message: String },
}

impl fmt::Display for StudentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "student id must not be empty"),
            Self::MissingId => write!(f, "student id is required for updates"),
            Self::MissingRollNo => write!(f, "roll number is required"),
            Self::PasswordSealing { message } => {
                write!(f, "password could not be sealed: {message}")
            }
        }
    }
}

impl std::error::Error for StudentValidationError {}

impl From<PasswordError> for StudentValidationError {
    fn from(value: PasswordError) -> Self {
        Self::PasswordSealing {
            message: value.to_string(),
        }
    }
}

/// Externally visible student identifier.
///
/// Accepts either a JSON string or a JSON integer on input and always
/// serialises as a string.
///
/// # Examples
/// ```
/// use students::domain::StudentId;
///
/// let id: StudentId = serde_json::from_str("42").expect("numeric id");
/// assert_eq!(id.as_ref(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStudentId", into = "String")]
pub struct StudentId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStudentId {
    Text(String),
    Number(i64),
}

impl StudentId {
    /// Validate and construct a [`StudentId`].
    pub fn new(id: impl Into<String>) -> Result<Self, StudentValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(StudentValidationError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Wrap an identifier minted by a store, which is never blank.
    pub(crate) fn from_store(id: String) -> Self {
        Self(id)
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StudentId> for String {
    fn from(value: StudentId) -> Self {
        value.0
    }
}

impl From<i64> for StudentId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<RawStudentId> for StudentId {
    type Error = StudentValidationError;

    fn try_from(value: RawStudentId) -> Result<Self, Self::Error> {
        match value {
            RawStudentId::Text(text) => Self::new(text),
            RawStudentId::Number(number) => Ok(Self::from(number)),
        }
    }
}

/// Canonical student record shared by every storage adapter.
///
/// The serialised form uses the field names stored by the document and
/// key-value backends: `rollno` for the roll number and `rank` (with
/// `student_rank` accepted on input).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StudentId>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "rollno")]
    pub roll_no: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub optional_subjects: Vec<String>,
    #[serde(default, alias = "student_rank")]
    pub rank: i32,
}

impl Student {
    /// Check the fields a new record must carry.
    pub fn validate_new(&self) -> Result<(), StudentValidationError> {
        if self.roll_no.trim().is_empty() {
            return Err(StudentValidationError::MissingRollNo);
        }
        Ok(())
    }

    /// Validate a new record and replace its password with a salted hash.
    ///
    /// Any caller-supplied identifier is discarded; the store assigns one.
    pub fn prepare_for_insert(&mut self) -> Result<(), StudentValidationError> {
        self.validate_new()?;
        self.id = None;
        self.password = password::seal(&self.password)?;
        Ok(())
    }

    /// Return the identifier an update targets.
    pub fn require_id(&self) -> Result<&StudentId, StudentValidationError> {
        self.id.as_ref().ok_or(StudentValidationError::MissingId)
    }

    /// Resolve the password an update should write, if any.
    ///
    /// See [`password::seal_for_update`].
    pub fn sealed_password_for_update(&self) -> Result<Option<String>, StudentValidationError> {
        Ok(password::seal_for_update(&self.password)?)
    }
}
