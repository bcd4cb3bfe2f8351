// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Who is logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

/// A student on the roster. `id` is the registration number (NISN) the
/// student logs in with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
}

/// DTO for adding a student to the roster.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 50, message = "Student id must not be empty."))]
    pub id: String,
    #[validate(length(min = 1, max = 100, message = "Student name must not be empty."))]
    pub name: String,
}

impl CreateStudentRequest {
    /// Trims both fields; whitespace-only input fails validation.
    pub fn into_student(self) -> Result<Student, validator::ValidationErrors> {
        let trimmed = CreateStudentRequest {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
        };
        trimmed.validate()?;
        Ok(Student {
            id: trimmed.id,
            name: trimmed.name,
        })
    }
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub role: Role,
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_student_is_rejected() {
        let req = CreateStudentRequest {
            id: "   ".into(),
            name: "Student".into(),
        };
        assert!(req.into_student().is_err());
    }

    #[test]
    fn student_fields_are_trimmed() {
        let req = CreateStudentRequest {
            id: " 0042 ".into(),
            name: " Dewi ".into(),
        };
        let s = req.into_student().unwrap();
        assert_eq!(s.id, "0042");
        assert_eq!(s.name, "Dewi");
    }
}
