// db/reviewdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError, userdb::USER_COLUMNS};
use crate::models::{
    jobmodel::{NewReview, Review},
    usermodel::User,
};

const REVIEW_COLUMNS: &str = r#"
    id, job_id, reviewer_id, reviewee_id, rating, comment, created_at
"#;

#[async_trait]
pub trait ReviewExt {
    /// `Conflict` when the reviewer already reviewed this job.
    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn get_reviews_by_job(&self, job_id: Uuid) -> Result<Vec<Review>, StoreError>;

    async fn get_reviews_by_reviewee(&self, reviewee_id: Uuid) -> Result<Vec<Review>, StoreError>;

    /// Recomputes the user's rating from every review they received.
    async fn refresh_user_rating(&self, user_id: Uuid) -> Result<User, StoreError>;
}

#[async_trait]
impl ReviewExt for DBClient {
    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO reviews (id, job_id, reviewer_id, reviewee_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        );

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(Uuid::new_v4())
            .bind(review.job_id)
            .bind(review.reviewer_id)
            .bind(review.reviewee_id)
            .bind(review.rating)
            .bind(review.comment)
            .fetch_one(&self.pool)
            .await?;

        Ok(review)
    }

    async fn get_reviews_by_job(&self, job_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE job_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn get_reviews_by_reviewee(&self, reviewee_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE reviewee_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(reviewee_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn refresh_user_rating(&self, user_id: Uuid) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET rating = (
                SELECT ROUND(AVG(rating)::numeric, 1)::float8
                FROM reviews
                WHERE reviewee_id = $1
            ),
            updated_at = NOW()
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
