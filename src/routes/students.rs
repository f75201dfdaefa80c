use crate::{
    data::{
        pagination::Pageable,
        student::{
            NewStudentBody, Student, UpdateStudentBody, validate_new_student,
            validate_student_update,
        },
    },
    error::{ErrorDetail, SchoolResult, ValidationSnafu},
    routes::{SchoolJson, SchoolPath, SchoolQuery},
    state::SchoolState,
};
use axum::{
    Json,
    extract::{OriginalUri, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

type QueryPairs = Vec<(String, String)>;

fn pageable(state: &SchoolState, pairs: &[(String, String)]) -> SchoolResult<Pageable> {
    Pageable::from_query_pairs(pairs, state.students_config().max_page_size)
}

/// Lists students, a page at a time.
#[utoipa::path(
    get,
    path = "/students/students",
    tag = "students",
    params(
        ("page" = Option<u32>, Query, description = "Page to return, starting at 0"),
        ("size" = Option<u32>, Query, description = "Page size, defaults to 2"),
        ("sort" = Option<Vec<String>>, Query, description = "Sort, eg. `name,desc`, repeatable"),
    ),
    responses(
        (status = 200, description = "The requested page of students", body = Vec<Student>),
        (status = 400, description = "Invalid paging parameters", body = ErrorDetail),
        (status = 500, description = "Store failure", body = ErrorDetail),
    )
)]
pub async fn get_students(
    State(state): State<SchoolState>,
    SchoolQuery(pairs): SchoolQuery<QueryPairs>,
) -> SchoolResult<Json<Vec<Student>>> {
    let pageable = pageable(&state, &pairs)?;
    let students = state.find_all(&pageable).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/students/Student/{id}",
    tag = "students",
    params(("id" = i64, Path, description = "Student id", example = 1)),
    responses(
        (status = 200, description = "Student exists", body = Student),
        (status = 400, description = "Id is not a number", body = ErrorDetail),
        (status = 404, description = "Student not found", body = ErrorDetail),
        (status = 500, description = "Store failure", body = ErrorDetail),
    )
)]
pub async fn get_student(
    State(state): State<SchoolState>,
    SchoolPath(id): SchoolPath<i64>,
) -> SchoolResult<Json<Student>> {
    Ok(Json(state.find_by_id(id).await?))
}

/// Lists students whose name contains `name`, a page at a time.
#[utoipa::path(
    get,
    path = "/students/student/namelike/{name}",
    tag = "students",
    params(
        ("name" = String, Path, description = "Substring to look for in names"),
        ("page" = Option<u32>, Query, description = "Page to return, starting at 0"),
        ("size" = Option<u32>, Query, description = "Page size, defaults to 2"),
        ("sort" = Option<Vec<String>>, Query, description = "Sort, eg. `name,desc`, repeatable"),
    ),
    responses(
        (status = 200, description = "Matching students", body = Vec<Student>),
        (status = 400, description = "Invalid paging parameters", body = ErrorDetail),
        (status = 500, description = "Store failure", body = ErrorDetail),
    )
)]
pub async fn get_students_name_like(
    State(state): State<SchoolState>,
    SchoolPath(name): SchoolPath<String>,
    SchoolQuery(pairs): SchoolQuery<QueryPairs>,
) -> SchoolResult<Json<Vec<Student>>> {
    let pageable = pageable(&state, &pairs)?;
    let students = state.find_by_name_like(&name, &pageable).await?;
    Ok(Json(students))
}

#[utoipa::path(
    post,
    path = "/students/Student",
    tag = "students",
    request_body = NewStudentBody,
    responses(
        (status = 201, description = "Student added",
            headers(("Location" = String, description = "URI of the new student"))),
        (status = 400, description = "Student failed validation", body = ErrorDetail),
        (status = 415, description = "Body is not JSON", body = ErrorDetail),
        (status = 500, description = "Failed to add student", body = ErrorDetail),
    )
)]
pub async fn post_student(
    State(state): State<SchoolState>,
    OriginalUri(uri): OriginalUri,
    SchoolJson(body): SchoolJson<NewStudentBody>,
) -> SchoolResult<impl IntoResponse> {
    let new_student =
        validate_new_student(body).map_err(|errors| ValidationSnafu { errors }.build())?;
    let student = state.save(new_student).await?;
    info!(id = student.id, "added student");

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), student.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]))
}

/// Updates the fields present in the body, leaving the rest alone.
#[utoipa::path(
    put,
    path = "/students/Student/{id}",
    tag = "students",
    params(("id" = i64, Path, description = "Student id", example = 1)),
    request_body = UpdateStudentBody,
    responses(
        (status = 200, description = "Student updated"),
        (status = 400, description = "Student failed validation", body = ErrorDetail),
        (status = 404, description = "Student not found", body = ErrorDetail),
        (status = 500, description = "Failed to update student", body = ErrorDetail),
    )
)]
pub async fn put_student(
    State(state): State<SchoolState>,
    SchoolPath(id): SchoolPath<i64>,
    SchoolJson(body): SchoolJson<UpdateStudentBody>,
) -> SchoolResult<StatusCode> {
    let changes =
        validate_student_update(body).map_err(|errors| ValidationSnafu { errors }.build())?;
    state.update(changes, id).await?;
    info!(id, "updated student");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/students/Student/{id}",
    tag = "students",
    params(("id" = i64, Path, description = "Student id", example = 1)),
    responses(
        (status = 200, description = "Student deleted"),
        (status = 404, description = "Student not found", body = ErrorDetail),
        (status = 500, description = "Failed to delete student", body = ErrorDetail),
    )
)]
pub async fn delete_student(
    State(state): State<SchoolState>,
    SchoolPath(id): SchoolPath<i64>,
) -> SchoolResult<StatusCode> {
    state.delete(id).await?;
    info!(id, "deleted student");

    Ok(StatusCode::OK)
}
