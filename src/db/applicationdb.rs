// db/applicationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError, jobdb::JOB_COLUMNS};
use crate::models::jobmodel::{AcceptOutcome, Application, ApplicationStatus, Job};

const APPLICATION_COLUMNS: &str = r#"
    id, job_id, seeker_id, message, status, created_at, responded_at
"#;

#[async_trait]
pub trait ApplicationExt {
    async fn create_application(
        &self,
        job_id: Uuid,
        seeker_id: Uuid,
        message: Option<String>,
    ) -> Result<Application, StoreError>;

    async fn get_application_by_id(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, StoreError>;

    async fn get_applications_by_job(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError>;

    async fn get_applications_by_seeker(
        &self,
        seeker_id: Uuid,
    ) -> Result<Vec<Application>, StoreError>;

    /// Pending applications across every job owned by `poster_id`.
    async fn get_pending_applications_for_poster(
        &self,
        poster_id: Uuid,
    ) -> Result<Vec<Application>, StoreError>;

    /// Moves `from -> to` only if the application is still in `from`, stamping `responded_at`.
    async fn transition_application(
        &self,
        application_id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<Option<Application>, StoreError>;

    /// Accepts a pending application on an open job, assigns the seeker and
    /// rejects every other pending application for that job, as one unit.
    /// `Conflict` if the application is no longer pending or the job no longer open.
    async fn accept_application(&self, application_id: Uuid) -> Result<AcceptOutcome, StoreError>;
}

#[async_trait]
impl ApplicationExt for DBClient {
    async fn create_application(
        &self,
        job_id: Uuid,
        seeker_id: Uuid,
        message: Option<String>,
    ) -> Result<Application, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO applications (id, job_id, seeker_id, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );

        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(Uuid::new_v4())
            .bind(job_id)
            .bind(seeker_id)
            .bind(message)
            .fetch_one(&self.pool)
            .await?;

        Ok(application)
    }

    async fn get_application_by_id(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    async fn get_applications_by_job(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE job_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, Application>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(applications)
    }

    async fn get_applications_by_seeker(
        &self,
        seeker_id: Uuid,
    ) -> Result<Vec<Application>, StoreError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE seeker_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        let applications = sqlx::query_as::<_, Application>(&sql)
            .bind(seeker_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(applications)
    }

    async fn get_pending_applications_for_poster(
        &self,
        poster_id: Uuid,
    ) -> Result<Vec<Application>, StoreError> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT a.id, a.job_id, a.seeker_id, a.message, a.status, a.created_at, a.responded_at
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.poster_id = $1 AND a.status = 'pending'
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(poster_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(applications)
    }

    async fn transition_application(
        &self,
        application_id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<Option<Application>, StoreError> {
        let sql = format!(
            r#"
            UPDATE applications
            SET status = $3, responded_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );

        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    async fn accept_application(&self, application_id: Uuid) -> Result<AcceptOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent accepts for the same job queue on the job row.
        let locked: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT j.id
            FROM jobs j
            JOIN applications a ON a.job_id = j.id
            WHERE a.id = $1
            FOR UPDATE OF j
            "#,
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound);
        }

        let accept_sql = format!(
            r#"
            UPDATE applications
            SET status = 'accepted', responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let accepted = sqlx::query_as::<_, Application>(&accept_sql)
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::Conflict("application is no longer pending".to_string()))?;

        let assign_sql = format!(
            r#"
            UPDATE jobs
            SET status = 'in_progress', assigned_to = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&assign_sql)
            .bind(accepted.job_id)
            .bind(accepted.seeker_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::Conflict("job is no longer open".to_string()))?;

        let reject_sql = format!(
            r#"
            UPDATE applications
            SET status = 'rejected', responded_at = NOW()
            WHERE job_id = $1 AND id <> $2 AND status = 'pending'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let rejected = sqlx::query_as::<_, Application>(&reject_sql)
            .bind(accepted.job_id)
            .bind(accepted.id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(AcceptOutcome {
            job,
            accepted,
            rejected,
        })
    }
}
