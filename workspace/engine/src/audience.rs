//! Who gets told, how early, and on which devices.

use std::collections::BTreeMap;

use common::PushMessage;
use model::entities::{device, notification_preference};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, trace, warn};

use crate::error::Result;
use crate::push::{PushGateway, Subscription};

/// One push-enabled device of a user.
#[derive(Debug, Clone)]
pub struct DeliveryTarget {
    pub device_id: i32,
    pub preference_id: i32,
    pub subscription: Subscription,
}

/// A user with at least one push-enabled preference.
#[derive(Debug, Clone)]
pub struct UserAudience {
    pub user_id: i32,
    /// Smallest `days_before_notify` among the user's preferences.
    pub lead_days: i32,
    pub targets: Vec<DeliveryTarget>,
}

/// Counts from pushing one message to every device of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub delivered: u32,
    pub failed: u32,
}

impl UserAudience {
    /// Pushes `message` to every device. A failing device is logged and skipped.
    pub async fn deliver(&self, push: &dyn PushGateway, message: &PushMessage) -> DeliveryOutcome {
        let mut outcome = DeliveryOutcome::default();

        for target in &self.targets {
            match push.send(&target.subscription, message).await {
                Ok(()) => {
                    trace!(
                        "Delivered push to device {} of user {}",
                        target.device_id, self.user_id
                    );
                    outcome.delivered += 1;
                }
                Err(e) => {
                    warn!(
                        "Push to device {} of user {} failed: {}",
                        target.device_id, self.user_id, e
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

/// Loads every user that can receive pushes, keyed by user id.
///
/// Only preferences with push enabled and a lead time set (including 0)
/// count. When a user's devices disagree on the lead time the smallest one
/// wins, so the earliest requested notice is honoured.
#[instrument(skip(db))]
pub async fn load_audiences<C: ConnectionTrait>(db: &C) -> Result<BTreeMap<i32, UserAudience>> {
    let rows = notification_preference::Entity::find()
        .filter(notification_preference::Column::PushEnabled.eq(true))
        .filter(notification_preference::Column::DaysBeforeNotify.is_not_null())
        .find_also_related(device::Entity)
        .order_by_asc(notification_preference::Column::Id)
        .all(db)
        .await?;

    let mut audiences: BTreeMap<i32, UserAudience> = BTreeMap::new();

    for (preference, device) in rows {
        let Some(device) = device else {
            warn!("Preference {} has no device, skipping", preference.id);
            continue;
        };
        let lead_days = preference.days_before_notify.unwrap_or(0).max(0);

        let audience = audiences.entry(device.user_id).or_insert_with(|| UserAudience {
            user_id: device.user_id,
            lead_days,
            targets: Vec::new(),
        });
        audience.lead_days = audience.lead_days.min(lead_days);
        audience.targets.push(DeliveryTarget {
            device_id: device.id,
            preference_id: preference.id,
            subscription: Subscription::new(preference.subscription),
        });
    }

    debug!("Loaded {} push audiences", audiences.len());
    Ok(audiences)
}
