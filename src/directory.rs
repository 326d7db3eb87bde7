//! Identity store for student and alumni profiles. Deliberately thin: field
//! validation and lookups only, no lifecycle logic. Credential hashing is an
//! external concern; passwords are compared directly here.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::ids;
use crate::ledger::{Caller, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub course: String,
    pub phone: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlumniProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub profession: String,
    pub company: String,
    pub total_experience: u32,
    pub phone: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterStudent {
    pub name: String,
    pub email: String,
    pub password: String,
    pub course: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAlumni {
    pub name: String,
    pub email: String,
    pub password: String,
    pub profession: String,
    pub company: String,
    pub total_experience: u32,
    pub phone: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Default)]
struct DirectoryState {
    students: HashMap<String, StudentProfile>,
    alumni: HashMap<String, AlumniProfile>,
}

pub struct UserDirectory {
    state: Mutex<DirectoryState>,
}

impl UserDirectory {
    pub fn new() -> Self {
        UserDirectory {
            state: Mutex::new(DirectoryState::default()),
        }
    }

    pub fn register_student(
        &self,
        req: RegisterStudent,
        now: NaiveDateTime,
    ) -> Result<StudentProfile, ServiceError> {
        let email = normalize_email(&req.email)?;
        let profile = StudentProfile {
            id: ids::new_id(),
            name: required(&req.name, "name")?,
            email,
            password: required(&req.password, "password")?,
            course: required(&req.course, "course")?,
            phone: required(&req.phone, "phone")?,
            created_at: now,
        };

        let mut state = self.state.lock().unwrap();
        ensure_email_free(&state, &profile.email)?;
        state.students.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    pub fn register_alumni(
        &self,
        req: RegisterAlumni,
        now: NaiveDateTime,
    ) -> Result<AlumniProfile, ServiceError> {
        let email = normalize_email(&req.email)?;
        let profile = AlumniProfile {
            id: ids::new_id(),
            name: required(&req.name, "name")?,
            email,
            password: required(&req.password, "password")?,
            profession: required(&req.profession, "profession")?,
            company: required(&req.company, "company")?,
            total_experience: req.total_experience,
            phone: required(&req.phone, "phone")?,
            location: req.location.filter(|s| !s.trim().is_empty()),
            description: req.description.filter(|s| !s.trim().is_empty()),
            created_at: now,
        };

        let mut state = self.state.lock().unwrap();
        ensure_email_free(&state, &profile.email)?;
        state.alumni.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    /// Resolves email+password to a caller identity. Students are checked
    /// first, then alumni.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Caller, ServiceError> {
        let email = normalize_email(email)?;
        let state = self.state.lock().unwrap();
        if let Some(student) = state.students.values().find(|s| s.email == email) {
            if student.password == password {
                return Ok(Caller::new(student.id.clone(), Role::Student));
            }
            return Err(invalid_credentials());
        }
        if let Some(alumni) = state.alumni.values().find(|a| a.email == email) {
            if alumni.password == password {
                return Ok(Caller::new(alumni.id.clone(), Role::Alumni));
            }
        }
        Err(invalid_credentials())
    }

    pub fn find_student(&self, id: &str) -> Option<StudentProfile> {
        self.state.lock().unwrap().students.get(id).cloned()
    }

    pub fn find_alumni(&self, id: &str) -> Option<AlumniProfile> {
        self.state.lock().unwrap().alumni.get(id).cloned()
    }

    /// Display name for either kind of user.
    pub fn display_name(&self, id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .students
            .get(id)
            .map(|s| s.name.clone())
            .or_else(|| state.alumni.get(id).map(|a| a.name.clone()))
    }

    /// All alumni profiles, sorted by name, for the public directory.
    pub fn list_alumni(&self) -> Vec<AlumniProfile> {
        let mut alumni: Vec<AlumniProfile> =
            self.state.lock().unwrap().alumni.values().cloned().collect();
        alumni.sort_by(|a, b| a.name.cmp(&b.name));
        alumni
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ServiceError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

fn normalize_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::Validation(
            "a valid email is required".to_string(),
        ));
    }
    Ok(email)
}

fn ensure_email_free(state: &DirectoryState, email: &str) -> Result<(), ServiceError> {
    let taken = state.students.values().any(|s| s.email == email)
        || state.alumni.values().any(|a| a.email == email);
    if taken {
        Err(ServiceError::Validation(
            "email is already registered".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Validation("invalid email or password".to_string())
}
