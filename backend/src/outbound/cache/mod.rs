//! Redis adapter storing students as JSON blobs in per-record hashes.

mod redis_student_repository;

pub use redis_student_repository::{
    DATA_FIELD, LIST_KEY, NEXT_ID_KEY, RedisStudentRepository, record_key,
};
