//! Student API handlers.
//!
//! ```text
//! GET    /students          (bearer)
//! GET    /students/{id}     (bearer)
//! POST   /students          (open)
//! PUT    /students          (bearer)
//! DELETE /students/{id}     (bearer)
//! ```
//!
//! Request bodies use the stored record's field names; responses omit the
//! password entirely.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Student, StudentId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerClaims;
use crate::inbound::http::state::HttpState;

/// Student record accepted by `POST /students` and `PUT /students`.
///
/// Example JSON:
/// `{"rollno":"12345","name":"John Doe","class":"10","optional_subjects":["Math"]}`
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct StudentPayload {
    /// Identifier; ignored on create, required on update.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "42")]
    pub id: Option<StudentId>,
    #[serde(default)]
    pub email: String,
    /// Plaintext password; sealed before it reaches the store.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[schema(example = "12345")]
    pub rollno: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub optional_subjects: Vec<String>,
    #[serde(default, alias = "student_rank")]
    pub rank: i32,
}

impl From<StudentPayload> for Student {
    fn from(payload: StudentPayload) -> Self {
        let StudentPayload {
            id,
            email,
            password,
            name,
            rollno,
            class,
            optional_subjects,
            rank,
        } = payload;
        Self {
            id,
            email,
            password,
            name,
            roll_no: rollno,
            class,
            optional_subjects,
            rank,
        }
    }
}

/// Student record returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "507f1f77bcf86cd799439011")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    pub rollno: String,
    pub class: String,
    pub optional_subjects: Vec<String>,
    pub rank: i32,
}

impl From<Student> for StudentBody {
    fn from(student: Student) -> Self {
        Self {
            id: student.id.map(String::from),
            email: student.email,
            name: student.name,
            rollno: student.roll_no,
            class: student.class,
            optional_subjects: student.optional_subjects,
            rank: student.rank,
        }
    }
}

/// List every stored student.
#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "Students", body = [StudentBody]),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["students"],
    operation_id = "listStudents"
)]
#[get("/students")]
pub async fn list_students(
    state: web::Data<HttpState>,
    _claims: BearerClaims,
) -> ApiResult<web::Json<Vec<StudentBody>>> {
    let students = state.students.list().await?;
    Ok(web::Json(
        students.into_iter().map(StudentBody::from).collect(),
    ))
}

/// Fetch a single student.
#[utoipa::path(
    get,
    path = "/students/{id}",
    params(("id" = String, Path, description = "Backend-specific student identifier")),
    responses(
        (status = 200, description = "Student", body = StudentBody),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 404, description = "Student not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["students"],
    operation_id = "getStudent"
)]
#[get("/students/{id}")]
pub async fn get_student(
    state: web::Data<HttpState>,
    _claims: BearerClaims,
    path: web::Path<String>,
) -> ApiResult<web::Json<StudentBody>> {
    let student = state.students.get(&path.into_inner()).await?;
    Ok(web::Json(student.into()))
}

/// Create a student. The store assigns the identifier.
#[utoipa::path(
    post,
    path = "/students",
    request_body = StudentPayload,
    responses(
        (status = 201, description = "Student created", body = StudentBody),
        (status = 400, description = "Malformed request body", body = Error),
        (status = 500, description = "Validation or store failure", body = Error)
    ),
    tags = ["students"],
    operation_id = "createStudent",
    security([])
)]
#[post("/students")]
pub async fn create_student(
    state: web::Data<HttpState>,
    payload: web::Json<StudentPayload>,
) -> ApiResult<HttpResponse> {
    let created = state
        .students
        .create(Student::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::Created().json(StudentBody::from(created)))
}

/// Update a student identified by the body's `id`.
///
/// Merge rules depend on the configured backend.
#[utoipa::path(
    put,
    path = "/students",
    request_body = StudentPayload,
    responses(
        (status = 200, description = "Submitted record", body = StudentBody),
        (status = 400, description = "Malformed identifier or body", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 500, description = "Validation or store failure", body = Error)
    ),
    tags = ["students"],
    operation_id = "updateStudent"
)]
#[put("/students")]
pub async fn update_student(
    state: web::Data<HttpState>,
    _claims: BearerClaims,
    payload: web::Json<StudentPayload>,
) -> ApiResult<web::Json<StudentBody>> {
    let updated = state
        .students
        .update(Student::from(payload.into_inner()))
        .await?;
    Ok(web::Json(updated.into()))
}

/// Delete a student. Deleting an absent record succeeds.
#[utoipa::path(
    delete,
    path = "/students/{id}",
    params(("id" = String, Path, description = "Backend-specific student identifier")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["students"],
    operation_id = "deleteStudent"
)]
#[delete("/students/{id}")]
pub async fn delete_student(
    state: web::Data<HttpState>,
    _claims: BearerClaims,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.students.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register every student route on a service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_students)
        .service(get_student)
        .service(create_student)
        .service(update_student)
        .service(delete_student);
}
