use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref FORBIDDEN_PASSWORD: Regex = Regex::new(r"(?i)password").unwrap();
}

fn validate_password_content(password: &str) -> Result<(), ValidationError> {
    if FORBIDDEN_PASSWORD.is_match(password) {
        let mut error = ValidationError::new("password_content");
        error.message = Some("Password cannot contain \"password\"".into());
        return Err(error);
    }
    Ok(())
}

/// One entry of a principal's active-session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

/// Locations of the three stored avatar sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarSet {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// A registered user.
///
/// `password_hash` and `sessions` are skipped by serde, so a `User` can be
/// returned from handlers as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub age: i32,
    /// `None` means the user has no image.
    pub avatar: Option<AvatarSet>,
    #[serde(skip)]
    pub sessions: Vec<Session>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_session(&self, token: &str) -> bool {
        self.sessions.iter().any(|session| session.token == token)
    }
}

/// Sign-up payload.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(
        length(min = 7, message = "Password must be at least 7 characters"),
        custom = "validate_password_content"
    )]
    pub password: String,
    #[validate(range(min = 0, message = "Age must not be negative"))]
    pub age: Option<i32>,
}

impl SignUpRequest {
    /// Trims the name and canonicalises the email before validation.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            ..self
        }
    }
}

/// Login payload. Not validated: any mismatch is an authentication failure.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The only profile fields a user may change.
///
/// Unknown keys (including `id` or `_id`) fail deserialization.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
    #[validate(
        length(min = 7, message = "Password must be at least 7 characters"),
        custom = "validate_password_content"
    )]
    pub password: Option<String>,
    #[validate(range(min = 0, message = "Age must not be negative"))]
    pub age: Option<i32>,
}

impl ProfileUpdate {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            ..self
        }
    }
}

/// A user ready to be persisted. Only ever holds a password digest.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
}

/// Profile changes as handed to the store, with the password already hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.age.is_none()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(password: &str) -> SignUpRequest {
        SignUpRequest {
            name: "  Ada  ".to_string(),
            email: " Ada@Example.COM ".to_string(),
            password: password.to_string(),
            age: Some(36),
        }
    }

    #[test]
    fn test_sign_up_normalization_and_validation() {
        let input = sign_up("correct-horse").normalized();
        assert_eq!(input.name, "Ada");
        assert_eq!(input.email, "ada@example.com");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert!(sign_up("short").normalized().validate().is_err());
        assert!(sign_up("myPassWord1").normalized().validate().is_err());
    }

    #[test]
    fn test_negative_age_is_rejected() {
        let mut input = sign_up("correct-horse");
        input.age = Some(-1);
        assert!(input.normalized().validate().is_err());
    }

    #[test]
    fn test_age_has_no_upper_bound() {
        let mut input = sign_up("correct-horse");
        input.age = Some(151);
        assert!(input.normalized().validate().is_ok());

        let update = ProfileUpdate {
            age: Some(200),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().is_ok());

        let update = ProfileUpdate {
            age: Some(-3),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_profile_update_rejects_unknown_fields() {
        let result: Result<ProfileUpdate, _> = serde_json::from_str(r#"{"_id":"x"}"#);
        assert!(result.is_err());

        let result: Result<ProfileUpdate, _> = serde_json::from_str(r#"{"sessions":[]}"#);
        assert!(result.is_err());

        let update: ProfileUpdate = serde_json::from_str(r#"{"name":"Grace"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("Grace"));
    }

    #[test]
    fn test_sensitive_fields_are_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$04$digest".into(),
            age: 0,
            avatar: None,
            sessions: vec![Session {
                token: "token".into(),
            }],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("sessions").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json["avatar"].is_null());
    }
}
