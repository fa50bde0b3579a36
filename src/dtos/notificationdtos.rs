use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::notificationmodel::Notification;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NotificationQueryDto {
    #[serde(default)]
    pub unread_only: bool,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl NotificationQueryDto {
    /// `(limit, offset)` with page 1 and limit 20 as defaults.
    pub fn window(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (limit, (page - 1) * limit)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationListDto {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountDto {
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AffectedDto {
    pub affected: u64,
}
