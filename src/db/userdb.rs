// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError};
use crate::models::usermodel::{NewUser, ProfileUpdate, User};

pub(crate) const USER_COLUMNS: &str = r#"
    id, username, email, password, role,
    bio, skills, hourly_rate, location, phone, photo,
    rating, completed_jobs,
    created_at, updated_at
"#;

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, StoreError>;

    async fn increment_completed_jobs(&self, user_id: Uuid) -> Result<User, StoreError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
            user = sqlx::query_as::<_, User>(&sql)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
            user = sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password, role, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .bind(user.phone)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                bio = COALESCE($3, bio),
                skills = COALESCE($4, skills),
                hourly_rate = COALESCE($5, hourly_rate),
                location = COALESCE($6, location),
                phone = COALESCE($7, phone),
                photo = COALESCE($8, photo),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(update.username)
            .bind(update.bio)
            .bind(update.skills)
            .bind(update.hourly_rate)
            .bind(update.location)
            .bind(update.phone)
            .bind(update.photo)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn increment_completed_jobs(&self, user_id: Uuid) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET completed_jobs = completed_jobs + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }
}
