// db/notificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, error::StoreError};
use crate::models::notificationmodel::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str = r#"
    id, user_id, type, title, message, is_read, data, created_at
"#;

#[async_trait]
pub trait NotificationExt {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError>;

    /// Newest first.
    async fn get_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StoreError>;

    /// `None` when the notification does not exist or belongs to someone else.
    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Notification>, StoreError>;

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, StoreError>;

    async fn clear_notifications(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO notifications (id, user_id, type, title, message, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );

        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(Uuid::new_v4())
            .bind(notification.user_id)
            .bind(notification.notification_type)
            .bind(notification.title)
            .bind(notification.message)
            .bind(notification.data)
            .fetch_one(&self.pool)
            .await?;

        Ok(notification)
    }

    async fn get_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            NOTIFICATION_COLUMNS
        );

        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let sql = format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );

        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(notification)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn clear_notifications(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
