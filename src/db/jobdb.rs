// db/jobdb.rs
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{db::DBClient, error::StoreError};
use crate::models::jobmodel::{Job, JobFilter, JobStatus, JobUpdate, NewJob};

pub(crate) const JOB_COLUMNS: &str = r#"
    id, poster_id, title, description, category, location,
    rate, duration, is_urgent, status, assigned_to,
    created_at, updated_at, completed_at
"#;

#[async_trait]
pub trait JobExt {
    async fn create_job(&self, poster_id: Uuid, job: NewJob) -> Result<Job, StoreError>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Newest first.
    async fn search_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;

    /// Edits an `open` job. `None` when the job is missing or no longer open.
    async fn update_job_details(
        &self,
        job_id: Uuid,
        update: JobUpdate,
    ) -> Result<Option<Job>, StoreError>;

    /// Moves `from -> to` only if the job is still in `from`. Stamps
    /// `completed_at` when `to` is `Completed`.
    async fn transition_job(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError>;

    /// Removes an `open` job along with its applications. Returns the removed row.
    async fn delete_open_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, poster_id: Uuid, job: NewJob) -> Result<Job, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO jobs
            (id, poster_id, title, description, category, location, rate, duration, is_urgent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );

        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(Uuid::new_v4())
            .bind(poster_id)
            .bind(job.title)
            .bind(job.description)
            .bind(job.category)
            .bind(job.location)
            .bind(job.rate)
            .bind(job.duration)
            .bind(job.is_urgent)
            .fetch_one(&self.pool)
            .await?;

        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn search_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM jobs WHERE 1 = 1", JOB_COLUMNS));

        if let Some(category) = filter.category {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(poster_id) = filter.poster_id {
            builder.push(" AND poster_id = ").push_bind(poster_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            builder.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if let Some(location) = &filter.location {
            builder
                .push(" AND strpos(lower(location), lower(")
                .push_bind(location.clone())
                .push(")) > 0");
        }
        if let Some(text) = &filter.text {
            // plain substring match, so `%` and `_` in the query are literal
            builder
                .push(" AND (strpos(lower(title), lower(")
                .push_bind(text.clone())
                .push(")) > 0 OR strpos(lower(description), lower(")
                .push_bind(text.clone())
                .push(")) > 0)");
        }

        builder.push(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let jobs = builder
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn update_job_details(
        &self,
        job_id: Uuid,
        update: JobUpdate,
    ) -> Result<Option<Job>, StoreError> {
        let sql = format!(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                location = COALESCE($5, location),
                rate = COALESCE($6, rate),
                duration = COALESCE($7, duration),
                is_urgent = COALESCE($8, is_urgent),
                updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {}
            "#,
            JOB_COLUMNS
        );

        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .bind(update.title)
            .bind(update.description)
            .bind(update.category)
            .bind(update.location)
            .bind(update.rate)
            .bind(update.duration)
            .bind(update.is_urgent)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        let sql = format!(
            r#"
            UPDATE jobs
            SET status = $3,
                updated_at = NOW(),
                completed_at = CASE WHEN $3 = 'completed'::job_status THEN NOW() ELSE completed_at END
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            JOB_COLUMNS
        );

        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn delete_open_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let sql = format!(
            "DELETE FROM jobs WHERE id = $1 AND status = 'open' RETURNING {}",
            JOB_COLUMNS
        );

        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }
}
