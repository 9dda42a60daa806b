//! Authentication service
//!
//! Provides business logic for login, student and lecturer registration, and
//! token verification. Coordinates the account repositories with the JWT
//! service and the environment-configured superadmin.

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::auth::jwt::{Claims, JwtService, SUPERADMIN_SUBJECT, UserRole};
use crate::core::auth::password::{hash_password, verify_password};
use crate::core::config::AdminCredentials;
use crate::core::db::models::{
    CreateLecturer, CreateStudent, Gender, Lecturer, LecturerPosition, Specialization, Student,
};
use crate::core::db::repositories::{
    LecturerRepository, LecturerRepositoryError, StudentConflicts, StudentRepository,
    StudentRepositoryError,
};
use crate::core::response::ApiError;
use crate::core::validation::{
    ValidationErrors, is_alphanumeric, is_valid_email, length_between, parse_date, parse_enum,
    string_or_number,
};

const INCORRECT_CREDENTIALS: &str = "Email or password is incorrect";
const REGISTRATION_FAILED: &str = "Registration failed";

// ============================================================================
// Requests
// ============================================================================

/// Login request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Student registration request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterStudentRequest {
    pub student_id_number: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub nic_number: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub academic_year: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub semester: Option<String>,
    pub specialization: Option<String>,
}

/// Lecturer registration request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterLecturerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub position: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// The synthetic user behind the environment superadmin credentials
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuperadminUser {
    pub id: &'static str,
    pub name: &'static str,
    pub email: String,
    pub role: UserRole,
}

impl SuperadminUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: SUPERADMIN_SUBJECT,
            name: "Super Admin",
            email: email.into(),
            role: UserRole::Superadmin,
        }
    }
}

/// Any authenticated account
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AuthUser {
    Student(Box<Student>),
    Lecturer(Box<Lecturer>),
    Superadmin(SuperadminUser),
}

impl AuthUser {
    pub fn role(&self) -> UserRole {
        match self {
            AuthUser::Student(_) => UserRole::Student,
            AuthUser::Lecturer(_) => UserRole::Lecture,
            AuthUser::Superadmin(_) => UserRole::Superadmin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: AuthUser,
    pub token: String,
    pub user_role: UserRole,
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub user: AuthUser,
    pub user_role: UserRole,
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRegistered {
    pub student: Student,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LecturerRegistered {
    pub lecturer: Lecturer,
}

// ============================================================================
// Validation
// ============================================================================

/// Validated student registration, ready to be hashed and stored
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRegistration {
    pub student_id_number: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub nic_number: String,
    pub academic_year: String,
    pub semester: String,
    pub specialization: Specialization,
}

impl StudentRegistration {
    fn into_create(self, password_hash: String) -> CreateStudent {
        CreateStudent {
            student_id_number: self.student_id_number,
            name: self.name,
            email: self.email,
            password_hash,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            address: self.address,
            nic_number: self.nic_number,
            academic_year: self.academic_year,
            semester: self.semester,
            specialization: self.specialization,
        }
    }
}

/// Validated lecturer registration
#[derive(Debug, Clone, PartialEq)]
pub struct LecturerRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub position: LecturerPosition,
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Check both login fields are present
pub fn validate_login(request: &LoginRequest) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require(request.email.as_deref(), "email", "Email");
    errors.require(request.password.as_deref(), "password", "Password");
    errors.into_result()?;

    Ok((
        request.email.clone().unwrap_or_default().trim().to_string(),
        request.password.clone().unwrap_or_default(),
    ))
}

/// Validate a student registration form. Email and student id come back lowercased.
pub fn validate_student_registration(
    request: &RegisterStudentRequest,
) -> Result<StudentRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let student_id_number = trimmed(&request.student_id_number);
    let name = trimmed(&request.name);
    let email = trimmed(&request.email);
    let nic_number = trimmed(&request.nic_number);
    let address = trimmed(&request.address);

    errors.require(student_id_number, "studentIdNumber", "Student ID number");
    errors.require(name, "name", "Name");
    errors.require(email, "email", "Email");
    errors.require(request.password.as_deref(), "password", "Password");
    errors.require(
        request.password_confirmation.as_deref(),
        "passwordConfirmation",
        "Password confirmation",
    );
    errors.require(request.gender.as_deref(), "gender", "Gender");
    errors.require(request.date_of_birth.as_deref(), "dateOfBirth", "Date of birth");
    errors.require(address, "address", "Address");
    errors.require(nic_number, "nicNumber", "NIC number");
    errors.require(request.academic_year.as_deref(), "academicYear", "Academic Year");
    errors.require(request.semester.as_deref(), "semester", "Semester");
    errors.require(request.specialization.as_deref(), "specialization", "Specialization");

    if let Some(id) = student_id_number {
        errors.check(
            is_alphanumeric(id),
            "studentIdNumber",
            "Student ID must contain only letters and numbers",
        );
    }
    if let Some(name) = name {
        errors.check(
            length_between(name, 2, 50),
            "name",
            "Name must be between 2 and 50 characters",
        );
    }
    if let Some(email) = email {
        errors.check(is_valid_email(email), "email", "Please provide a valid email");
    }
    if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
        errors.check(
            password.chars().count() >= 6,
            "password",
            "Password must be at least 6 characters",
        );
        if let Some(confirmation) = request.password_confirmation.as_deref()
            && !confirmation.is_empty()
        {
            errors.check(
                password == confirmation,
                "passwordConfirmation",
                "Passwords do not match",
            );
        }
    }
    if let Some(nic) = nic_number {
        errors.check(
            is_alphanumeric(nic),
            "nicNumber",
            "NIC number must contain only letters and numbers",
        );
    }

    let gender = trimmed(&request.gender).and_then(|g| {
        let parsed = parse_enum::<Gender>(g);
        errors.check(parsed.is_some(), "gender", "Gender must be male, female, or other");
        parsed
    });
    let date_of_birth = trimmed(&request.date_of_birth).and_then(|d| {
        let parsed = parse_date(d);
        errors.check(parsed.is_some(), "dateOfBirth", "Invalid date of birth");
        parsed
    });
    let academic_year = trimmed(&request.academic_year).filter(|y| {
        let valid = matches!(*y, "1" | "2" | "3" | "4");
        errors.check(valid, "academicYear", "Academic year must be 1, 2, 3, or 4");
        valid
    });
    let semester = trimmed(&request.semester).filter(|s| {
        let valid = matches!(*s, "1" | "2");
        errors.check(valid, "semester", "Semester must be 1 or 2");
        valid
    });
    let specialization = trimmed(&request.specialization).and_then(|s| {
        let parsed = parse_enum::<Specialization>(s);
        errors.check(parsed.is_some(), "specialization", "Invalid specialization");
        parsed
    });

    errors.into_result()?;

    match (
        student_id_number,
        name,
        email,
        request.password.as_deref(),
        gender,
        date_of_birth,
        address,
        nic_number,
        academic_year,
        semester,
        specialization,
    ) {
        (
            Some(student_id_number),
            Some(name),
            Some(email),
            Some(password),
            Some(gender),
            Some(date_of_birth),
            Some(address),
            Some(nic_number),
            Some(academic_year),
            Some(semester),
            Some(specialization),
        ) => Ok(StudentRegistration {
            student_id_number: student_id_number.to_lowercase(),
            name: name.to_string(),
            email: email.to_lowercase(),
            password: password.to_string(),
            gender,
            date_of_birth,
            address: address.to_string(),
            nic_number: nic_number.to_string(),
            academic_year: academic_year.to_string(),
            semester: semester.to_string(),
            specialization,
        }),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.add("request", "Incomplete registration");
            Err(errors)
        }
    }
}

/// Validate a lecturer registration form. The email comes back lowercased.
pub fn validate_lecturer_registration(
    request: &RegisterLecturerRequest,
) -> Result<LecturerRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = trimmed(&request.name);
    errors.check(
        name.is_some_and(|n| n.chars().count() >= 2),
        "name",
        "Name must be at least 2 characters",
    );

    let email = trimmed(&request.email);
    if errors.require(email, "email", "Email") {
        errors.check(
            email.is_some_and(is_valid_email),
            "email",
            "Please provide a valid email",
        );
    }

    let password = request.password.as_deref().filter(|p| !p.is_empty());
    if errors.require(password, "password", "Password") {
        errors.check(
            password.is_some_and(|p| p.chars().count() >= 6),
            "password",
            "Password must be at least 6 characters",
        );
    }

    let confirmation = request.confirm_password.as_deref().filter(|p| !p.is_empty());
    if errors.require(confirmation, "confirmPassword", "Password confirmation")
        && password.is_some()
    {
        errors.check(
            password == confirmation,
            "confirmPassword",
            "Passwords do not match",
        );
    }

    let gender = if errors.require(request.gender.as_deref(), "gender", "Gender") {
        let parsed = trimmed(&request.gender).and_then(parse_enum::<Gender>);
        errors.check(parsed.is_some(), "gender", "Gender must be male, female, or other");
        parsed
    } else {
        None
    };

    let date_of_birth =
        if errors.require(request.date_of_birth.as_deref(), "dateOfBirth", "Date of birth") {
            let parsed = trimmed(&request.date_of_birth).and_then(parse_date);
            errors.check(parsed.is_some(), "dateOfBirth", "Invalid date of birth");
            parsed
        } else {
            None
        };

    let position = if errors.require(request.position.as_deref(), "position", "Position") {
        let parsed = trimmed(&request.position).and_then(parse_enum::<LecturerPosition>);
        errors.check(
            parsed.is_some(),
            "position",
            "Invalid position. Must be lecture, instructure, or lic",
        );
        parsed
    } else {
        None
    };

    errors.into_result()?;

    match (name, email, password, gender, date_of_birth, position) {
        (
            Some(name),
            Some(email),
            Some(password),
            Some(gender),
            Some(date_of_birth),
            Some(position),
        ) => Ok(LecturerRegistration {
            name: name.to_string(),
            email: email.to_lowercase(),
            password: password.to_string(),
            gender,
            date_of_birth,
            position,
        }),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.add("request", "Incomplete registration");
            Err(errors)
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    students: StudentRepository,
    lecturers: LecturerRepository,
    jwt_service: JwtService,
    admin: Option<AdminCredentials>,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(
        students: StudentRepository,
        lecturers: LecturerRepository,
        jwt_service: JwtService,
        admin: Option<AdminCredentials>,
    ) -> Self {
        Self {
            students,
            lecturers,
            jwt_service,
            admin,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Login with the superadmin pair, or as a student, or as a lecturer
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let (email, password) = validate_login(&request)?;

        if let Some(admin) = &self.admin
            && admin.matches(&email, &password)
        {
            let (token, _) =
                self.jwt_service
                    .generate_token(SUPERADMIN_SUBJECT, &admin.username, UserRole::Superadmin)?;

            tracing::info!("Superadmin logged in");
            return Ok(LoginResponse {
                user: AuthUser::Superadmin(SuperadminUser::new(admin.username.clone())),
                token,
                user_role: UserRole::Superadmin,
                is_super_admin: true,
            });
        }

        let email = email.to_lowercase();
        let user = match self.students.find_by_email(&email).await? {
            Some(student) => AuthUser::Student(Box::new(student)),
            None => match self.lecturers.find_by_email(&email).await? {
                Some(lecturer) => AuthUser::Lecturer(Box::new(lecturer)),
                None => return Err(invalid_credentials("email")),
            },
        };

        let (id, password_hash, is_verified) = match &user {
            AuthUser::Student(s) => (s.id, s.password_hash.as_str(), s.is_verified),
            AuthUser::Lecturer(l) => (l.id, l.password_hash.as_str(), l.is_verified),
            AuthUser::Superadmin(_) => return Err(invalid_credentials("email")),
        };

        if !verify_password(&password, password_hash)? {
            return Err(invalid_credentials("password"));
        }

        if !is_verified {
            let mut errors = ValidationErrors::new();
            errors.add("email", "Your account is pending admin approval");
            return Err(ApiError::field_errors(
                StatusCode::FORBIDDEN,
                "Account pending approval",
                errors,
            ));
        }

        let role = user.role();
        let token = self.jwt_service.generate_user_token(id, &email, role)?;

        tracing::info!("User {} logged in as {}", id, role);
        Ok(LoginResponse {
            user,
            token,
            user_role: role,
            is_super_admin: false,
        })
    }

    /// Register an unverified student and issue a token
    pub async fn register_student(
        &self,
        request: RegisterStudentRequest,
    ) -> Result<StudentRegistered, ApiError> {
        let registration = validate_student_registration(&request)?;

        let conflicts = self
            .students
            .find_conflicts(
                &registration.email,
                &registration.student_id_number,
                &registration.nic_number,
            )
            .await?;

        if conflicts.any() {
            return Err(student_conflict(conflicts));
        }

        let password_hash = hash_password(&registration.password)?;
        let dto = registration.into_create(password_hash);
        let student = match self.students.create(&dto).await {
            Ok(student) => student,
            // A concurrent registration took one of the unique fields
            Err(StudentRepositoryError::AlreadyExists) => {
                let conflicts = self
                    .students
                    .find_conflicts(&dto.email, &dto.student_id_number, &dto.nic_number)
                    .await?;
                return Err(student_conflict(conflicts));
            }
            Err(e) => return Err(e.into()),
        };

        let token =
            self.jwt_service
                .generate_user_token(student.id, &student.email, UserRole::Student)?;

        Ok(StudentRegistered { student, token })
    }

    /// Register a lecturer; lecturers are verified on creation
    pub async fn register_lecturer(
        &self,
        request: RegisterLecturerRequest,
    ) -> Result<LecturerRegistered, ApiError> {
        let registration = validate_lecturer_registration(&request)?;

        if self
            .lecturers
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(lecturer_conflict());
        }

        let password_hash = hash_password(&registration.password)?;
        let created = self
            .lecturers
            .create(&CreateLecturer {
                name: registration.name,
                email: registration.email,
                password_hash,
                gender: registration.gender,
                date_of_birth: registration.date_of_birth,
                position: registration.position,
                is_verified: true,
            })
            .await;

        let lecturer = match created {
            Ok(lecturer) => lecturer,
            Err(LecturerRepositoryError::EmailAlreadyExists) => return Err(lecturer_conflict()),
            Err(e) => return Err(e.into()),
        };

        Ok(LecturerRegistered { lecturer })
    }

    /// Resolve the account behind validated claims
    pub async fn verify(&self, claims: &Claims) -> Result<VerifyResponse, ApiError> {
        if claims.is_superadmin() {
            let email = self
                .admin
                .as_ref()
                .map(|a| a.username.clone())
                .unwrap_or_default();
            return Ok(VerifyResponse {
                user: AuthUser::Superadmin(SuperadminUser::new(email)),
                user_role: UserRole::Superadmin,
                is_super_admin: true,
            });
        }

        let id = claims
            .user_id()
            .map_err(|_| ApiError::unauthorized("User not found"))?;

        let user = match claims.user_role {
            UserRole::Student => self
                .students
                .find_by_id(id)
                .await?
                .map(|s| AuthUser::Student(Box::new(s))),
            UserRole::Lecture => self
                .lecturers
                .find_by_id(id)
                .await?
                .map(|l| AuthUser::Lecturer(Box::new(l))),
            UserRole::Superadmin => None,
        }
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        Ok(VerifyResponse {
            user_role: user.role(),
            user,
            is_super_admin: false,
        })
    }
}

fn invalid_credentials(field: &str) -> ApiError {
    let mut errors = ValidationErrors::new();
    errors.add(field, INCORRECT_CREDENTIALS);
    ApiError::field_errors(StatusCode::UNAUTHORIZED, "Invalid credentials", errors)
}

/// One field error per unique student field that is already taken
pub fn student_conflict_errors(conflicts: StudentConflicts) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if conflicts.email {
        errors.add("email", "Email is already registered");
    }
    if conflicts.student_id_number {
        errors.add("studentIdNumber", "Student ID is already registered");
    }
    if conflicts.nic_number {
        errors.add("nicNumber", "NIC number is already registered");
    }
    errors
}

fn student_conflict(conflicts: StudentConflicts) -> ApiError {
    let mut errors = student_conflict_errors(conflicts);
    if errors.is_empty() {
        errors.add("email", "Email is already registered");
    }
    ApiError::validation_with(REGISTRATION_FAILED, errors)
}

fn lecturer_conflict() -> ApiError {
    let mut errors = ValidationErrors::new();
    errors.add("email", "This email is already registered");
    ApiError::validation_with(REGISTRATION_FAILED, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_request() -> RegisterStudentRequest {
        RegisterStudentRequest {
            student_id_number: Some("IT22586766".to_string()),
            name: Some("Nimal Perera".to_string()),
            email: Some("Nimal@Example.com".to_string()),
            password: Some("secret1".to_string()),
            password_confirmation: Some("secret1".to_string()),
            gender: Some("male".to_string()),
            date_of_birth: Some("2002-05-17".to_string()),
            address: Some("Colombo".to_string()),
            nic_number: Some("200212345678".to_string()),
            academic_year: Some("3".to_string()),
            semester: Some("1".to_string()),
            specialization: Some("SE".to_string()),
        }
    }

    fn lecturer_request() -> RegisterLecturerRequest {
        RegisterLecturerRequest {
            name: Some("Dr. Silva".to_string()),
            email: Some("silva@uni.ac.lk".to_string()),
            password: Some("secret1".to_string()),
            confirm_password: Some("secret1".to_string()),
            gender: Some("female".to_string()),
            date_of_birth: Some("1980-02-02".to_string()),
            position: Some("lic".to_string()),
        }
    }

    // ========================================================================
    // Login Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_login_requires_both_fields() {
        let errors = validate_login(&LoginRequest::default()).unwrap_err();
        assert_eq!(errors.get("email").unwrap(), ["Email is required"]);
        assert_eq!(errors.get("password").unwrap(), ["Password is required"]);
    }

    #[test]
    fn test_validate_login_trims_email() {
        let (email, password) = validate_login(&LoginRequest {
            email: Some(" a@b.com ".to_string()),
            password: Some(" pw ".to_string()),
        })
        .unwrap();
        assert_eq!(email, "a@b.com");
        assert_eq!(password, " pw ");
    }

    // ========================================================================
    // Student Registration Tests
    // ========================================================================

    #[test]
    fn test_student_registration_valid_normalizes() {
        let registration = validate_student_registration(&student_request()).unwrap();

        assert_eq!(registration.student_id_number, "it22586766");
        assert_eq!(registration.email, "nimal@example.com");
        assert_eq!(registration.specialization, Specialization::Se);
        assert_eq!(registration.gender, Gender::Male);
        assert_eq!(
            registration.date_of_birth,
            NaiveDate::from_ymd_opt(2002, 5, 17).unwrap()
        );
    }

    #[test]
    fn test_student_registration_missing_fields() {
        let errors =
            validate_student_registration(&RegisterStudentRequest::default()).unwrap_err();

        for field in [
            "studentIdNumber",
            "name",
            "email",
            "password",
            "passwordConfirmation",
            "gender",
            "dateOfBirth",
            "address",
            "nicNumber",
            "academicYear",
            "semester",
            "specialization",
        ] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
        assert_eq!(errors.get("academicYear").unwrap(), ["Academic Year is required"]);
    }

    #[test]
    fn test_student_registration_enum_ranges() {
        let request = RegisterStudentRequest {
            academic_year: Some("5".to_string()),
            semester: Some("3".to_string()),
            specialization: Some("ME".to_string()),
            gender: Some("unknown".to_string()),
            ..student_request()
        };

        let errors = validate_student_registration(&request).unwrap_err();
        assert_eq!(
            errors.get("academicYear").unwrap(),
            ["Academic year must be 1, 2, 3, or 4"]
        );
        assert_eq!(errors.get("semester").unwrap(), ["Semester must be 1 or 2"]);
        assert_eq!(errors.get("specialization").unwrap(), ["Invalid specialization"]);
        assert!(errors.contains("gender"));
    }

    #[test]
    fn test_student_registration_password_rules() {
        let request = RegisterStudentRequest {
            password: Some("abc".to_string()),
            password_confirmation: Some("abd".to_string()),
            ..student_request()
        };

        let errors = validate_student_registration(&request).unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["Password must be at least 6 characters"]
        );
        assert_eq!(
            errors.get("passwordConfirmation").unwrap(),
            ["Passwords do not match"]
        );
    }

    #[test]
    fn test_student_registration_identifier_shapes() {
        let request = RegisterStudentRequest {
            student_id_number: Some("IT-2258".to_string()),
            nic_number: Some("2002 1234".to_string()),
            name: Some("N".to_string()),
            email: Some("not-an-email".to_string()),
            ..student_request()
        };

        let errors = validate_student_registration(&request).unwrap_err();
        assert!(errors.contains("studentIdNumber"));
        assert!(errors.contains("nicNumber"));
        assert_eq!(
            errors.get("name").unwrap(),
            ["Name must be between 2 and 50 characters"]
        );
        assert_eq!(errors.get("email").unwrap(), ["Please provide a valid email"]);
    }

    #[test]
    fn test_student_request_accepts_numeric_year() {
        let json = r#"{"studentIdNumber": "it1", "academicYear": 2, "semester": 1}"#;
        let request: RegisterStudentRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.academic_year.as_deref(), Some("2"));
        assert_eq!(request.semester.as_deref(), Some("1"));
        assert!(request.name.is_none());
    }

    // ========================================================================
    // Lecturer Registration Tests
    // ========================================================================

    #[test]
    fn test_lecturer_registration_valid() {
        let registration = validate_lecturer_registration(&lecturer_request()).unwrap();
        assert_eq!(registration.position, LecturerPosition::Lic);
        assert_eq!(registration.gender, Gender::Female);
    }

    #[test]
    fn test_lecturer_registration_invalid_position() {
        let request = RegisterLecturerRequest {
            position: Some("professor".to_string()),
            ..lecturer_request()
        };

        let errors = validate_lecturer_registration(&request).unwrap_err();
        assert_eq!(
            errors.get("position").unwrap(),
            ["Invalid position. Must be lecture, instructure, or lic"]
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_lecturer_registration_mismatch_and_missing() {
        let request = RegisterLecturerRequest {
            name: Some(" A ".to_string()),
            confirm_password: Some("other1".to_string()),
            date_of_birth: None,
            ..lecturer_request()
        };

        let errors = validate_lecturer_registration(&request).unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            ["Name must be at least 2 characters"]
        );
        assert_eq!(
            errors.get("confirmPassword").unwrap(),
            ["Passwords do not match"]
        );
        assert_eq!(
            errors.get("dateOfBirth").unwrap(),
            ["Date of birth is required"]
        );
    }

    #[test]
    fn test_lecturer_email_lowercased() {
        let request = RegisterLecturerRequest {
            email: Some("Silva@Uni.AC.lk".to_string()),
            ..lecturer_request()
        };
        let registration = validate_lecturer_registration(&request).unwrap();
        assert_eq!(registration.email, "silva@uni.ac.lk");
    }

    // ========================================================================
    // Response Shape Tests
    // ========================================================================

    #[test]
    fn test_superadmin_login_response_shape() {
        let response = LoginResponse {
            user: AuthUser::Superadmin(SuperadminUser::new("admin@smartlms.local")),
            token: "t".to_string(),
            user_role: UserRole::Superadmin,
            is_super_admin: true,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["id"], "superadmin");
        assert_eq!(json["user"]["name"], "Super Admin");
        assert_eq!(json["user"]["email"], "admin@smartlms.local");
        assert_eq!(json["userRole"], "superadmin");
        assert_eq!(json["isSuperAdmin"], true);
    }

    #[test]
    fn test_invalid_credentials_error() {
        let err = invalid_credentials("password");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Invalid credentials");
        match err {
            ApiError::Validation { errors, .. } => {
                assert_eq!(errors.get("password").unwrap(), [INCORRECT_CREDENTIALS]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    // ========================================================================
    // Registration Conflict Tests
    // ========================================================================

    #[test]
    fn test_student_conflict_errors_per_field() {
        let errors = student_conflict_errors(StudentConflicts {
            email: true,
            student_id_number: false,
            nic_number: true,
        });

        assert_eq!(errors.get("email").unwrap(), ["Email is already registered"]);
        assert_eq!(errors.get("nicNumber").unwrap(), ["NIC number is already registered"]);
        assert!(!errors.contains("studentIdNumber"));
    }

    #[test]
    fn test_duplicate_student_email_is_registration_failure() {
        let err = student_conflict(StudentConflicts {
            email: true,
            ..Default::default()
        });

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Registration failed");
        match err {
            ApiError::Validation { errors, .. } => {
                assert_eq!(errors.get("email").unwrap(), ["Email is already registered"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_student_id_and_nic_keys() {
        let err = student_conflict(StudentConflicts {
            email: false,
            student_id_number: true,
            nic_number: true,
        });

        match err {
            ApiError::Validation { errors, .. } => {
                assert!(errors.contains("studentIdNumber"));
                assert!(errors.contains("nicNumber"));
                assert!(!errors.contains("email"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_student_conflict_without_known_field_falls_back_to_email() {
        match student_conflict(StudentConflicts::default()) {
            ApiError::Validation { errors, message, .. } => {
                assert_eq!(message, "Registration failed");
                assert!(errors.contains("email"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_lecturer_email_is_registration_failure() {
        let err = lecturer_conflict();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Registration failed");
        match err {
            ApiError::Validation { errors, .. } => {
                assert_eq!(errors.get("email").unwrap(), ["This email is already registered"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
