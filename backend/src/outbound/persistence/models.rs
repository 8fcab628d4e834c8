//! Internal Diesel row structs for the PostgreSQL adapter.
//!
//! These types never leave the persistence layer.

use diesel::prelude::*;

use crate::domain::{Student, StudentId};

use super::schema::students;

/// Row struct for reading from the students table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StudentRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub rollno: String,
    pub class: String,
    pub optional_subjects: Vec<String>,
    pub student_rank: i32,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: Some(StudentId::from(i64::from(row.id))),
            email: row.email,
            password: row.password,
            name: row.name,
            roll_no: row.rollno,
            class: row.class,
            optional_subjects: row.optional_subjects,
            rank: row.student_rank,
        }
    }
}

/// Insertable struct for creating new student records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = students)]
pub(crate) struct NewStudentRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub rollno: &'a str,
    pub class: &'a str,
    pub optional_subjects: &'a [String],
    pub student_rank: i32,
}

impl<'a> From<&'a Student> for NewStudentRow<'a> {
    fn from(student: &'a Student) -> Self {
        Self {
            name: &student.name,
            email: &student.email,
            password: &student.password,
            rollno: &student.roll_no,
            class: &student.class,
            optional_subjects: &student.optional_subjects,
            student_rank: student.rank,
        }
    }
}

/// Changeset applying only the non-zero fields of an update payload.
///
/// `None` columns are left untouched by Diesel, so empty strings, an empty
/// subject list and a zero rank never overwrite stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = students)]
pub(crate) struct StudentChangeset<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<String>,
    pub rollno: Option<&'a str>,
    pub class: Option<&'a str>,
    pub optional_subjects: Option<&'a [String]>,
    pub student_rank: Option<i32>,
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl<'a> StudentChangeset<'a> {
    /// Build a changeset from an update payload and its resolved password.
    pub fn from_payload(student: &'a Student, password: Option<String>) -> Self {
        Self {
            name: non_empty(&student.name),
            email: non_empty(&student.email),
            password,
            rollno: non_empty(&student.roll_no),
            class: non_empty(&student.class),
            optional_subjects: (!student.optional_subjects.is_empty())
                .then_some(student.optional_subjects.as_slice()),
            student_rank: (student.rank != 0).then_some(student.rank),
        }
    }

    /// Return `true` when no column would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    //! Changeset construction from update payloads.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn zero_values_are_skipped() {
        let payload = Student {
            name: "Jane Doe".into(),
            ..Student::default()
        };
        let changeset = StudentChangeset::from_payload(&payload, None);

        assert_eq!(changeset.name, Some("Jane Doe"));
        assert_eq!(changeset.student_rank, None);
        assert_eq!(changeset.optional_subjects, None);
        assert_eq!(changeset.rollno, None);
        assert!(!changeset.is_empty());
    }

    #[rstest]
    fn empty_payload_changes_nothing() {
        let payload = Student::default();
        assert!(StudentChangeset::from_payload(&payload, None).is_empty());
    }

    #[rstest]
    fn non_zero_values_are_kept() {
        let payload = Student {
            optional_subjects: vec!["Art".into()],
            rank: 4,
            ..Student::default()
        };
        let changeset = StudentChangeset::from_payload(&payload, Some("$hash".into()));

        assert_eq!(changeset.student_rank, Some(4));
        assert_eq!(changeset.optional_subjects, Some(&["Art".to_owned()][..]));
        assert_eq!(changeset.password.as_deref(), Some("$hash"));
    }

    #[rstest]
    fn rows_map_to_students_with_string_ids() {
        let row = StudentRow {
            id: 12,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "$hash".into(),
            rollno: "1".into(),
            class: "10".into(),
            optional_subjects: vec!["Math".into()],
            student_rank: 2,
        };
        let student = Student::from(row);
        assert_eq!(student.id, Some(StudentId::from(12)));
        assert_eq!(student.roll_no, "1");
        assert_eq!(student.rank, 2);
    }
}
