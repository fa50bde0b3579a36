use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::models::usermodel::{ProfileUpdate, User, UserRole};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: Option<String>,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    pub role: UserRole,
}

impl RegisterUserDto {
    /// Falls back to the local part of the email when no username was sent.
    pub fn display_name(&self) -> String {
        match self.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if phone.is_empty() || phone.chars().filter(|c| c.is_ascii_digit()).count() >= 10 {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("phone");
        err.message = Some("Invalid phone number".into());
        Err(err)
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: Option<String>,

    #[validate(length(max = 1000, message = "Bio must not exceed 1000 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 30, message = "At most 30 skills"))]
    pub skills: Option<Vec<String>>,

    #[validate(range(
        min = 0.0,
        max = 9999999999.99,
        message = "Hourly rate must be between 0 and 9999999999.99"
    ))]
    pub hourly_rate: Option<f64>,

    pub location: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(url(message = "Photo must be a URL"))]
    pub photo: Option<String>,
}

impl UpdateProfileDto {
    pub fn into_update(self) -> ProfileUpdate {
        use crate::utils::{
            decimal::money_from_f64,
            sanitize::{clean_optional, clean_text},
        };

        ProfileUpdate {
            username: clean_optional(self.username),
            bio: clean_optional(self.bio),
            skills: self.skills.map(|skills| {
                skills
                    .iter()
                    .map(|s| clean_text(s))
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            hourly_rate: self.hourly_rate.and_then(money_from_f64),
            location: clean_optional(self.location),
            phone: self.phone,
            photo: self.photo,
        }
    }
}

/// What the owner sees about themselves.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub profile: PublicProfile,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            phone: user.phone.clone(),
            profile: PublicProfile::from_user(user),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// What every signed-in user may see about someone else.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub hourly_rate: Option<BigDecimal>,
    pub location: Option<String>,
    pub photo: Option<String>,
    pub rating: Option<f64>,
    pub completed_jobs: i32,
}

impl PublicProfile {
    pub fn from_user(user: &User) -> Self {
        PublicProfile {
            user_id: user.id,
            display_name: user.username.to_owned(),
            role: user.role,
            bio: user.bio.clone(),
            skills: user.skills.clone(),
            hourly_rate: user.hourly_rate.clone(),
            location: user.location.clone(),
            photo: user.photo.clone(),
            rating: user.rating,
            completed_jobs: user.completed_jobs,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, phone: Option<&str>) -> RegisterUserDto {
        RegisterUserDto {
            username: None,
            email: email.to_string(),
            password: password.to_string(),
            phone: phone.map(str::to_string),
            role: UserRole::Seeker,
        }
    }

    #[test]
    fn register_validation() {
        assert!(register("sam@example.com", "secret1", None).validate().is_ok());
        assert!(register("sam@example.com", "secret1", Some("")).validate().is_ok());
        assert!(register("sam@example.com", "secret1", Some("07700 900123"))
            .validate()
            .is_ok());

        assert!(register("not-an-email", "secret1", None).validate().is_err());
        assert!(register("sam@example.com", "short", None).validate().is_err());
        assert!(register("sam@example.com", "secret1", Some("123")).validate().is_err());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let dto = register("sam.jones@example.com", "secret1", None);
        assert_eq!(dto.display_name(), "sam.jones");

        let dto = RegisterUserDto {
            username: Some("  Sam  ".to_string()),
            ..dto
        };
        assert_eq!(dto.display_name(), "Sam");
    }

    #[test]
    fn profile_update_strips_markup() {
        let update = UpdateProfileDto {
            bio: Some("<b>Handy</b> with tools".to_string()),
            skills: Some(vec!["<i>plumbing</i>".to_string(), "<br>".to_string()]),
            hourly_rate: Some(18.5),
            ..Default::default()
        }
        .into_update();

        assert_eq!(update.bio.as_deref(), Some("Handy with tools"));
        assert_eq!(update.skills, Some(vec!["plumbing".to_string()]));
        assert!(update.hourly_rate.is_some());
        assert!(update.username.is_none());
    }

    #[test]
    fn markup_only_username_is_left_unchanged() {
        let update = UpdateProfileDto {
            username: Some("<b></b>".to_string()),
            ..Default::default()
        }
        .into_update();
        assert!(update.username.is_none());

        let update = UpdateProfileDto {
            username: Some(" <i>Sam</i> ".to_string()),
            ..Default::default()
        }
        .into_update();
        assert_eq!(update.username.as_deref(), Some("Sam"));
    }

    #[test]
    fn hourly_rate_must_fit_the_column() {
        let dto = UpdateProfileDto {
            hourly_rate: Some(1e10),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
