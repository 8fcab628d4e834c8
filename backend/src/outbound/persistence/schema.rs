//! Diesel table definitions for the PostgreSQL store.
//!
//! The table is created and reconciled at startup by
//! [`super::postgres_schema`]; keep both in step when columns change.

diesel::table! {
    /// Student records.
    students (id) {
        /// `SERIAL` primary key exposed as the student identifier.
        id -> Int4,
        name -> Text,
        email -> Text,
        password -> Text,
        rollno -> Text,
        class -> Text,
        /// Ordered subject names, duplicates allowed.
        optional_subjects -> Array<Text>,
        student_rank -> Int4,
    }
}
