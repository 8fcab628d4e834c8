//! MongoDB-backed `StudentRepository` implementation.
//!
//! Identifiers are 12-byte ObjectIds exposed as 24-character lowercase hex
//! strings. Updates only `$set` the non-empty name, roll number and class;
//! subjects, rank, email and password are never touched after creation.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{Student, StudentId};

/// Stored document shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StudentDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    rollno: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    optional_subjects: Vec<String>,
    #[serde(default, alias = "student_rank")]
    rank: i32,
}

impl From<StudentDocument> for Student {
    fn from(document: StudentDocument) -> Self {
        Self {
            id: document.id.as_ref().map(student_id),
            email: document.email,
            password: document.password,
            name: document.name,
            roll_no: document.rollno,
            class: document.class,
            optional_subjects: document.optional_subjects,
            rank: document.rank,
        }
    }
}

impl From<&Student> for StudentDocument {
    fn from(student: &Student) -> Self {
        Self {
            id: None,
            name: student.name.clone(),
            email: student.email.clone(),
            password: student.password.clone(),
            rollno: student.roll_no.clone(),
            class: student.class.clone(),
            optional_subjects: student.optional_subjects.clone(),
            rank: student.rank,
        }
    }
}

fn student_id(oid: &ObjectId) -> StudentId {
    StudentId::from_store(oid.to_hex())
}

/// Parse a 24-character hex string into an ObjectId.
fn parse_object_id(id: &str) -> Result<ObjectId, StudentRepositoryError> {
    ObjectId::parse_str(id).map_err(|err| StudentRepositoryError::malformed_id(id, err.to_string()))
}

/// Build the `$set` update for `student`, or `None` when it changes nothing.
///
/// Empty fields are left out so a name-only payload keeps the stored roll
/// number and class.
fn update_document(student: &Student) -> Option<Document> {
    let fields = [
        ("name", student.name.as_str()),
        ("rollno", student.roll_no.as_str()),
        ("class", student.class.as_str()),
    ];
    let set: Document = fields
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| (field.to_owned(), Bson::from(value)))
        .collect();

    (!set.is_empty()).then(|| doc! { "$set": set })
}

fn map_mongo_error(error: mongodb::error::Error) -> StudentRepositoryError {
    use mongodb::error::ErrorKind;

    debug!(error = %error, "mongodb operation failed");
    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => {
            StudentRepositoryError::connection(error.to_string())
        }
        _ => StudentRepositoryError::query(error.to_string()),
    }
}

/// MongoDB implementation of the `StudentRepository` port.
#[derive(Clone)]
pub struct MongoStudentRepository {
    client: Client,
    database: String,
    collection: Collection<StudentDocument>,
}

impl MongoStudentRepository {
    /// Connect to `url` and bind to `database.collection`.
    ///
    /// The driver connects lazily, so callers should follow with
    /// [`MongoStudentRepository::ping`] to surface connectivity failures.
    pub async fn connect(
        url: &str,
        database: &str,
        collection: &str,
    ) -> Result<Self, StudentRepositoryError> {
        let options = ClientOptions::parse(url)
            .await
            .map_err(|err| StudentRepositoryError::connection(err.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|err| StudentRepositoryError::connection(err.to_string()))?;
        let collection = client.database(database).collection(collection);

        Ok(Self {
            client,
            database: database.to_owned(),
            collection,
        })
    }

    /// Issue a `ping` command against the configured database.
    pub async fn ping(&self) -> Result<(), StudentRepositoryError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }
}

#[async_trait]
impl StudentRepository for MongoStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(map_mongo_error)?;
        let documents: Vec<StudentDocument> =
            cursor.try_collect().await.map_err(map_mongo_error)?;

        Ok(documents.into_iter().map(Student::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Student>, StudentRepositoryError> {
        let oid = parse_object_id(id)?;
        let document = self
            .collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo_error)?;

        Ok(document.map(Student::from))
    }

    async fn create(&self, student: &mut Student) -> Result<(), StudentRepositoryError> {
        student.prepare_for_insert()?;
        let result = self
            .collection
            .insert_one(StudentDocument::from(&*student))
            .await
            .map_err(map_mongo_error)?;

        match result.inserted_id {
            Bson::ObjectId(oid) => {
                student.id = Some(student_id(&oid));
                Ok(())
            }
            other => Err(StudentRepositoryError::query(format!(
                "unexpected inserted id type: {other}"
            ))),
        }
    }

    async fn update(&self, student: &Student) -> Result<(), StudentRepositoryError> {
        let oid = parse_object_id(student.require_id()?.as_str())?;
        let Some(update) = update_document(student) else {
            debug!(id = %oid, "update carries no mutable fields");
            return Ok(());
        };
        let result = self
            .collection
            .update_one(doc! { "_id": oid }, update)
            .await
            .map_err(map_mongo_error)?;

        if result.matched_count == 0 {
            debug!(id = %oid, "update matched no student");
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StudentRepositoryError> {
        let oid = parse_object_id(id)?;
        self.collection
            .delete_one(doc! { "_id": oid })
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }
}
