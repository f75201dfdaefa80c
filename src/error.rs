use crate::data::student::FieldError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jiff::Timestamp;
use serde::Serialize;
use snafu::Snafu;
use std::{num::ParseIntError, str::ParseBoolError};
use utoipa::ToSchema;

pub type SchoolResult<T> = Result<T, SchoolError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SchoolError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as an integer", name))]
    ParseIntEnvVar {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a boolean", name))]
    ParseBoolEnvVar {
        source: ParseBoolError,
        name: &'static str,
    },
    #[snafu(display("Unknown student store {:?}, expected `postgres` or `memory`", found))]
    UnknownStore { found: String },
    #[snafu(display("Invalid value {:?} for query parameter `{}`", found, name))]
    InvalidPageParam { name: &'static str, found: String },
    #[snafu(display(
        "Invalid sort {:?}, expected `field(,field)*(,asc|desc)` with fields from `id`, `name`",
        found
    ))]
    InvalidSort { found: String },
    #[snafu(display("Invalid path parameter"))]
    InvalidPath { source: PathRejection },
    #[snafu(display("Invalid query string"))]
    InvalidQuery { source: QueryRejection },
    #[snafu(display("Invalid JSON body"))]
    JsonBody { source: JsonRejection },
    #[snafu(display("Student failed validation"))]
    Validation { errors: Vec<FieldError> },
    #[snafu(display("Unable to find student with id {}", id))]
    MissingStudent { id: i64 },
}

impl From<PathRejection> for SchoolError {
    fn from(source: PathRejection) -> Self {
        Self::InvalidPath { source }
    }
}

impl From<QueryRejection> for SchoolError {
    fn from(source: QueryRejection) -> Self {
        Self::InvalidQuery { source }
    }
}

impl From<JsonRejection> for SchoolError {
    fn from(source: JsonRejection) -> Self {
        Self::JsonBody { source }
    }
}

/// JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorDetail {
    #[schema(value_type = String, example = "Not Found")]
    title: &'static str,
    #[schema(example = 404)]
    status: u16,
    #[schema(example = "Unable to find student with id 9")]
    detail: String,
    #[schema(value_type = String, format = DateTime)]
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl SchoolError {
    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        match self {
            Self::OpenDatabase { .. } | Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::BadEnvVar { .. }
            | Self::ParseIntEnvVar { .. }
            | Self::ParseBoolEnvVar { .. }
            | Self::UnknownStore { .. } => ISE,
            Self::InvalidPageParam { .. } | Self::InvalidSort { .. } => BI,
            Self::InvalidPath { source } => source.status(),
            Self::InvalidQuery { source } => source.status(),
            Self::JsonBody { source } => source.status(),
            Self::Validation { .. } => BI,
            Self::MissingStudent { .. } => NF,
        }
    }
}

impl IntoResponse for SchoolError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(%self, %status_code, "Rejected request");
        }

        let detail = match &self {
            Self::InvalidPath { source } => source.body_text(),
            Self::InvalidQuery { source } => source.body_text(),
            Self::JsonBody { source } => source.body_text(),
            other => other.to_string(),
        };
        let errors = match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        };

        let body = ErrorDetail {
            title: status_code.canonical_reason().unwrap_or("Unknown Error"),
            status: status_code.as_u16(),
            detail,
            timestamp: Timestamp::now(),
            errors,
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_student_is_not_found() {
        let err = SchoolError::MissingStudent { id: 4 };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Unable to find student with id 4");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = SchoolError::MakeQuery {
            source: sqlx::Error::RowNotFound,
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = SchoolError::MakeQuery {
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn validation_errors_are_listed_in_body() -> Result<(), Box<dyn std::error::Error>> {
        let err = SchoolError::Validation {
            errors: vec![FieldError::new("name", "must not be blank")],
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(body["status"], 400);
        assert_eq!(body["title"], "Bad Request");
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][0]["message"], "must not be blank");
        Ok(())
    }
}
