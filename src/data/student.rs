use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Student {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ada")]
    pub name: String,
}

/// Body of a create request, before validation.
///
/// `name` is optional here so that a missing name is reported as a field
/// error rather than a deserialisation failure. Any `id` sent by the client is
/// ignored.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct NewStudentBody {
    #[schema(example = "Ada", max_length = 255)]
    pub name: Option<String>,
}

/// Body of an update request. Absent fields keep their stored values.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateStudentBody {
    #[schema(example = "Ada Lovelace", max_length = 255)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddStudent {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub name: Option<String>,
}

impl StudentChanges {
    pub fn apply_to(self, student: &mut Student) {
        if let Some(name) = self.name {
            student.name = name;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(value_type = String, example = "name")]
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn validate_name(name: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "must not be blank"));
        return None;
    }
    if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
        return None;
    }
    Some(name.to_string())
}

pub fn validate_new_student(body: NewStudentBody) -> Result<AddStudent, Vec<FieldError>> {
    let mut errors = vec![];

    let name = match body.name {
        Some(name) => validate_name(&name, &mut errors),
        None => {
            errors.push(FieldError::new("name", "is required"));
            None
        }
    };

    match name {
        Some(name) if errors.is_empty() => Ok(AddStudent { name }),
        _ => Err(errors),
    }
}

pub fn validate_student_update(
    body: UpdateStudentBody,
) -> Result<StudentChanges, Vec<FieldError>> {
    let mut errors = vec![];

    let name = body.name.and_then(|name| validate_name(&name, &mut errors));

    if errors.is_empty() {
        Ok(StudentChanges { name })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_student_is_trimmed() {
        let body = NewStudentBody {
            name: Some("  Ada Lovelace ".into()),
        };
        assert_eq!(
            validate_new_student(body),
            Ok(AddStudent {
                name: "Ada Lovelace".into()
            })
        );
    }

    #[test]
    fn new_student_requires_name() {
        let errors = validate_new_student(NewStudentBody::default()).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "is required")]);

        let errors = validate_new_student(NewStudentBody {
            name: Some("   ".into()),
        })
        .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "must not be blank")]);
    }

    #[test]
    fn overlong_names_are_rejected() {
        let body = NewStudentBody {
            name: Some("x".repeat(MAX_NAME_LEN + 1)),
        };
        let errors = validate_new_student(body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");

        let body = NewStudentBody {
            name: Some("é".repeat(MAX_NAME_LEN)),
        };
        assert!(validate_new_student(body).is_ok());
    }

    #[test]
    fn update_keeps_missing_fields() {
        let changes = validate_student_update(UpdateStudentBody::default()).unwrap();
        let mut student = Student {
            id: 3,
            name: "Grace".into(),
        };
        changes.apply_to(&mut student);
        assert_eq!(student.name, "Grace");

        let changes = validate_student_update(UpdateStudentBody {
            name: Some("Grace Hopper".into()),
        })
        .unwrap();
        changes.apply_to(&mut student);
        assert_eq!(student.name, "Grace Hopper");
        assert_eq!(student.id, 3);
    }

    #[test]
    fn update_rejects_blank_name() {
        let errors = validate_student_update(UpdateStudentBody {
            name: Some(String::new()),
        })
        .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "must not be blank")]);
    }
}
