//1
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Seeker,
    Poster,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Seeker => "seeker",
            UserRole::Poster => "poster",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,

    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub hourly_rate: Option<BigDecimal>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,

    /// Mean of every review rating received, one decimal. `None` until the first review.
    pub rating: Option<f64>,
    pub completed_jobs: i32,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted at registration, after hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
}

/// Partial profile edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub hourly_rate: Option<BigDecimal>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(bio) = &self.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(skills) = &self.skills {
            user.skills = skills.clone();
        }
        if let Some(rate) = &self.hourly_rate {
            user.hourly_rate = Some(rate.clone());
        }
        if let Some(location) = &self.location {
            user.location = Some(location.clone());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(photo) = &self.photo {
            user.photo = Some(photo.clone());
        }
    }
}
