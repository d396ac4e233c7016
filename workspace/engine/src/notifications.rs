use model::entities::notification;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{debug, instrument};

use crate::error::{EngineError, Result};

/// Notifications of a user, newest first.
#[instrument(skip(db))]
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    unread_only: bool,
) -> Result<Vec<notification::Model>> {
    let mut query = notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
    if unread_only {
        query = query.filter(notification::Column::IsRead.eq(false));
    }

    let notifications = query
        .order_by_desc(notification::Column::Date)
        .order_by_desc(notification::Column::Time)
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await?;
    debug!("Found {} notifications for user {}", notifications.len(), user_id);
    Ok(notifications)
}

#[instrument(skip(db))]
pub async fn mark_as_read(
    db: &DatabaseConnection,
    user_id: i32,
    notification_id: i32,
) -> Result<notification::Model> {
    let found = notification::Entity::find_by_id(notification_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Notification", notification_id))?;
    if found.user_id != user_id {
        return Err(EngineError::ownership("Notification", notification_id, user_id));
    }
    if found.is_read {
        return Ok(found);
    }

    let mut model: notification::ActiveModel = found.into();
    model.is_read = Set(true);
    Ok(model.update(db).await?)
}
