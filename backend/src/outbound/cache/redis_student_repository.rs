//! Redis-backed `StudentRepository` implementation.
//!
//! Each record lives in a hash at `student:<id>` with a single `data` field
//! holding the JSON-encoded student. Identifiers are allocated from the
//! `student:next_id` counter. Listing reads the legacy `students:` aggregate
//! key, which nothing maintains; it yields an empty list when absent.

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::debug;

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{Student, StudentId};

/// Counter used to mint new identifiers.
pub const NEXT_ID_KEY: &str = "student:next_id";
/// Legacy aggregate key read by `list`.
pub const LIST_KEY: &str = "students:";
/// Hash field holding the JSON record.
pub const DATA_FIELD: &str = "data";

/// Overwrite the record blob only while the key still exists, so an update
/// racing a `DEL` cannot resurrect the record.
const REPLACE_IF_PRESENT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
end
return 0
";

/// Build the hash key for a student id.
pub fn record_key(id: i64) -> String {
    format!("student:{id}")
}

fn parse_key_id(id: &str) -> Result<i64, StudentRepositoryError> {
    id.trim()
        .parse::<i64>()
        .map_err(|err| StudentRepositoryError::malformed_id(id, err.to_string()))
}

fn map_redis_error(error: RedisError) -> StudentRepositoryError {
    debug!(error = %error, "redis operation failed");
    if error.is_io_error() || error.is_connection_refusal() || error.is_timeout() {
        StudentRepositoryError::connection(error.to_string())
    } else {
        StudentRepositoryError::query(error.to_string())
    }
}

fn map_run_error(error: RunError<RedisError>) -> StudentRepositoryError {
    match error {
        RunError::User(err) => map_redis_error(err),
        RunError::TimedOut => StudentRepositoryError::connection("redis pool checkout timed out"),
    }
}

fn encode(student: &Student) -> Result<String, StudentRepositoryError> {
    serde_json::to_string(student)
        .map_err(|err| StudentRepositoryError::query(format!("failed to encode student: {err}")))
}

fn decode(blob: &str) -> Result<Student, StudentRepositoryError> {
    serde_json::from_str(blob)
        .map_err(|err| StudentRepositoryError::query(format!("malformed student blob: {err}")))
}

fn decode_list(blob: Option<&str>) -> Result<Vec<Student>, StudentRepositoryError> {
    match blob {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|err| StudentRepositoryError::query(format!("malformed student list: {err}"))),
    }
}

/// Build the record an update writes over `existing_blob`.
///
/// The whole blob is replaced by the payload, except that an empty payload
/// password keeps the stored hash.
fn replacement(
    student: &Student,
    key_id: i64,
    existing_blob: &str,
) -> Result<Student, StudentRepositoryError> {
    let mut replacement = student.clone();
    replacement.id = Some(StudentId::from(key_id));
    replacement.password = match student.sealed_password_for_update()? {
        Some(sealed) => sealed,
        None => decode(existing_blob)?.password,
    };
    Ok(replacement)
}

/// Redis implementation of the `StudentRepository` port over a bb8 pool.
#[derive(Clone)]
pub struct RedisStudentRepository {
    pool: Pool<RedisConnectionManager>,
}

impl RedisStudentRepository {
    /// Wrap an existing pool.
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    /// Build a pool against `url`.
    pub async fn connect(url: &str) -> Result<Self, StudentRepositoryError> {
        let manager = RedisConnectionManager::new(url).map_err(map_redis_error)?;
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .await
            .map_err(map_redis_error)?;
        Ok(Self::new(pool))
    }

    /// Send `PING` to prove the server is reachable.
    pub async fn ping(&self) -> Result<(), StudentRepositoryError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn conn(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, StudentRepositoryError> {
        self.pool.get().await.map_err(map_run_error)
    }

    async fn read_blob(
        conn: &mut PooledConnection<'_, RedisConnectionManager>,
        key: &str,
    ) -> Result<Option<String>, StudentRepositoryError> {
        redis::cmd("HGET")
            .arg(key)
            .arg(DATA_FIELD)
            .query_async(&mut **conn)
            .await
            .map_err(map_redis_error)
    }

    async fn write_blob(
        conn: &mut PooledConnection<'_, RedisConnectionManager>,
        key: &str,
        blob: &str,
    ) -> Result<(), StudentRepositoryError> {
        redis::cmd("HSET")
            .arg(key)
            .arg(DATA_FIELD)
            .arg(blob)
            .query_async::<()>(&mut **conn)
            .await
            .map_err(map_redis_error)
    }
}

#[async_trait]
impl StudentRepository for RedisStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let mut conn = self.conn().await?;
        let blob: Option<String> = redis::cmd("GET")
            .arg(LIST_KEY)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        decode_list(blob.as_deref())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Student>, StudentRepositoryError> {
        let key_id = parse_key_id(id)?;
        let mut conn = self.conn().await?;
        let Some(blob) = Self::read_blob(&mut conn, &record_key(key_id)).await? else {
            return Ok(None);
        };

        let mut student = decode(&blob)?;
        student.id = Some(StudentId::from(key_id));
        Ok(Some(student))
    }

    async fn create(&self, student: &mut Student) -> Result<(), StudentRepositoryError> {
        student.prepare_for_insert()?;
        let mut conn = self.conn().await?;
        let id: i64 = redis::cmd("INCR")
            .arg(NEXT_ID_KEY)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;

        student.id = Some(StudentId::from(id));
        let blob = encode(student)?;
        Self::write_blob(&mut conn, &record_key(id), &blob).await
    }

    async fn update(&self, student: &Student) -> Result<(), StudentRepositoryError> {
        let key_id = parse_key_id(student.require_id()?.as_str())?;
        let key = record_key(key_id);
        let mut conn = self.conn().await?;
        let Some(existing) = Self::read_blob(&mut conn, &key).await? else {
            debug!(id = key_id, "update matched no student");
            return Ok(());
        };

        let blob = encode(&replacement(student, key_id, &existing)?)?;
        let written: i64 = redis::cmd("EVAL")
            .arg(REPLACE_IF_PRESENT)
            .arg(1)
            .arg(&key)
            .arg(DATA_FIELD)
            .arg(blob)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        if written == 0 {
            debug!(id = key_id, "student deleted before update was written");
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StudentRepositoryError> {
        let key_id = parse_key_id(id)?;
        let mut conn = self.conn().await?;
        redis::cmd("DEL")
            .arg(record_key(key_id))
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::password;
    use rstest::rstest;

    #[rstest]
    fn record_keys_use_the_student_prefix() {
        assert_eq!(record_key(17), "student:17");
    }

    #[rstest]
    #[case("abc")]
    #[case("507f1f77bcf86cd799439011")]
    fn rejects_non_integer_keys(#[case] raw: &str) {
        assert!(matches!(
            parse_key_id(raw),
            Err(StudentRepositoryError::MalformedId { .. })
        ));
    }

    #[rstest]
    fn absent_list_key_is_empty() {
        assert!(decode_list(None).expect("decode").is_empty());
    }

    #[rstest]
    fn list_blob_decodes_records() {
        let students = decode_list(Some(r#"[{"id":"1","rollno":"12","name":"Ada"}]"#))
            .expect("decode list");
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Ada");
    }

    #[rstest]
    fn malformed_blob_is_a_query_error() {
        assert!(matches!(
            decode("{oops"),
            Err(StudentRepositoryError::Query { .. })
        ));
    }

    #[rstest]
    fn blobs_carry_id_and_subjects() {
        let student = Student {
            id: Some(StudentId::from(3)),
            roll_no: "9".into(),
            optional_subjects: vec!["Math".into(), "History".into()],
            ..Student::default()
        };
        let decoded = decode(&encode(&student).expect("encode")).expect("decode");
        assert_eq!(decoded, student);
    }

    fn stored_blob(password: &str) -> String {
        encode(&Student {
            id: Some(StudentId::from(5)),
            password: password.into(),
            name: "Ada".into(),
            roll_no: "12".into(),
            class: "10".into(),
            optional_subjects: vec!["Art".into()],
            rank: 2,
            ..Student::default()
        })
        .expect("encode")
    }

    #[rstest]
    fn empty_update_password_keeps_the_stored_hash() {
        let stored = password::seal("original").expect("hash password");
        let update = Student {
            id: Some(StudentId::from(99)),
            name: "Grace".into(),
            roll_no: "13".into(),
            ..Student::default()
        };

        let written = replacement(&update, 5, &stored_blob(&stored)).expect("replacement");
        assert_eq!(written.password, stored);
        assert_eq!(written.id, Some(StudentId::from(5)));
        assert_eq!(written.name, "Grace");
        assert!(written.optional_subjects.is_empty());
        assert_eq!(written.rank, 0);
    }

    #[rstest]
    #[case("fresh")]
    #[case("$hunter2")]
    fn plaintext_update_passwords_are_sealed(#[case] plaintext: &str) {
        let update = Student {
            id: Some(StudentId::from(5)),
            password: plaintext.into(),
            roll_no: "12".into(),
            ..Student::default()
        };

        let written = replacement(&update, 5, &stored_blob("ignored")).expect("replacement");
        assert_ne!(written.password, plaintext);
        assert!(password::verify(plaintext, &written.password));
    }

    #[rstest]
    fn replace_script_checks_existence_before_writing() {
        let exists = REPLACE_IF_PRESENT.find("EXISTS").expect("existence check");
        let write = REPLACE_IF_PRESENT.find("HSET").expect("hash write");
        assert!(exists < write);
    }
}
