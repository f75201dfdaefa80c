use crate::{
    data::student::{FieldError, NewStudentBody, Student, UpdateStudentBody},
    error::{ErrorDetail, SchoolError},
    state::SchoolState,
};
use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, Json, Path, Query},
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod students;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

#[derive(OpenApi)]
#[openapi(
    info(title = "School", description = "Students, with pagination and name search"),
    paths(
        students::get_students,
        students::get_student,
        students::get_students_name_like,
        students::post_student,
        students::put_student,
        students::delete_student,
    ),
    components(schemas(Student, NewStudentBody, UpdateStudentBody, FieldError, ErrorDetail)),
    tags((name = "students", description = "Student management"))
)]
pub struct ApiDoc;

/// [`Path`] that reports failures as a [`SchoolError`] JSON body.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(SchoolError))]
pub struct SchoolPath<T>(pub T);

/// [`Query`] that reports failures as a [`SchoolError`] JSON body.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(SchoolError))]
pub struct SchoolQuery<T>(pub T);

/// [`Json`] that reports failures as a [`SchoolError`] JSON body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(SchoolError))]
pub struct SchoolJson<T>(pub T);

pub fn router(state: SchoolState) -> Router {
    let students = Router::new()
        .route("/students", get(students::get_students))
        .route("/Student", post(students::post_student))
        .route(
            "/Student/{id}",
            get(students::get_student)
                .put(students::put_student)
                .delete(students::delete_student),
        )
        .route(
            "/student/namelike/{name}",
            get(students::get_students_name_like),
        );

    Router::new()
        .nest("/students", students)
        .with_state(state)
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
}
