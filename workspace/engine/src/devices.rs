//! Devices and their push preferences.

use common::Clock;
use model::entities::{device, notification, notification_preference};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};

use crate::error::{EngineError, Result};

/// At most this many push-enabled preferences per user.
pub const MAX_ACTIVE_PREFERENCES_PER_USER: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRequest {
    pub push_enabled: bool,
    /// Serialized push subscription as produced by the browser.
    pub subscription: String,
    pub days_before_notify: Option<i32>,
}

/// Rows removed by [`unsubscribe_device`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnsubscribeOutcome {
    pub preferences_removed: u64,
    pub notifications_removed: u64,
}

#[instrument(skip(db, clock))]
pub async fn register_device(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    user_id: i32,
    name: &str,
) -> Result<device::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::Validation("device name must not be empty".to_string()));
    }

    let saved = device::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        created_at: Set(clock.now().naive_local()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Registered device {} for user {}", saved.id, user_id);
    Ok(saved)
}

pub async fn find_owned_device(
    db: &DatabaseConnection,
    user_id: i32,
    device_id: i32,
) -> Result<device::Model> {
    let device = device::Entity::find_by_id(device_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Device", device_id))?;
    if device.user_id != user_id {
        return Err(EngineError::ownership("Device", device_id, user_id));
    }
    Ok(device)
}

/// Number of push-enabled preferences across all of the user's devices.
pub async fn count_active_preferences(db: &DatabaseConnection, user_id: i32) -> Result<u64> {
    let count = notification_preference::Entity::find()
        .inner_join(device::Entity)
        .filter(device::Column::UserId.eq(user_id))
        .filter(notification_preference::Column::PushEnabled.eq(true))
        .count(db)
        .await?;
    Ok(count)
}

#[instrument(skip(db, request), fields(push_enabled = request.push_enabled))]
pub async fn create_preference(
    db: &DatabaseConnection,
    user_id: i32,
    device_id: i32,
    request: PreferenceRequest,
) -> Result<notification_preference::Model> {
    if request.days_before_notify.is_some_and(|days| days < 0) {
        return Err(EngineError::Validation(
            "days_before_notify must not be negative".to_string(),
        ));
    }
    if request.subscription.trim().is_empty() {
        return Err(EngineError::Validation("subscription must not be empty".to_string()));
    }

    find_owned_device(db, user_id, device_id).await?;

    if request.push_enabled {
        let active = count_active_preferences(db, user_id).await?;
        if active >= MAX_ACTIVE_PREFERENCES_PER_USER {
            warn!("User {} already has {} push-enabled preferences", user_id, active);
            return Err(EngineError::LimitReached(format!(
                "user {user_id} already has {MAX_ACTIVE_PREFERENCES_PER_USER} push-enabled devices"
            )));
        }
    }

    let saved = notification_preference::ActiveModel {
        device_id: Set(device_id),
        push_enabled: Set(request.push_enabled),
        subscription: Set(request.subscription),
        days_before_notify: Set(request.days_before_notify),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created preference {} for device {}", saved.id, device_id);
    Ok(saved)
}

/// Drops the device's preferences and the user's notifications in one transaction.
#[instrument(skip(db))]
pub async fn unsubscribe_device(
    db: &DatabaseConnection,
    user_id: i32,
    device_id: i32,
) -> Result<UnsubscribeOutcome> {
    find_owned_device(db, user_id, device_id).await?;

    let txn = db.begin().await?;
    let preferences = notification_preference::Entity::delete_many()
        .filter(notification_preference::Column::DeviceId.eq(device_id))
        .exec(&txn)
        .await?;
    let notifications = notification::Entity::delete_many()
        .filter(notification::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    let outcome = UnsubscribeOutcome {
        preferences_removed: preferences.rows_affected,
        notifications_removed: notifications.rows_affected,
    };
    info!(
        "Unsubscribed device {} of user {}: {:?}",
        device_id, user_id, outcome
    );
    Ok(outcome)
}
