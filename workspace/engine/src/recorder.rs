use std::sync::Arc;

use chrono::NaiveDate;
use common::{Clock, PushMessage};
use model::entities::{notice_log, notification};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::{debug, instrument};

use crate::error::Result;

/// What a notification is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationLinks {
    pub debt_id: Option<i32>,
    pub amortization_id: Option<i32>,
    pub recurring_transaction_id: Option<i32>,
    /// Due date of the installment or occurrence.
    pub occurrence_date: Option<NaiveDate>,
}

impl NotificationLinks {
    pub fn installment(debt_id: i32, amortization_id: i32, due_date: NaiveDate) -> Self {
        Self {
            debt_id: Some(debt_id),
            amortization_id: Some(amortization_id),
            occurrence_date: Some(due_date),
            ..Default::default()
        }
    }

    pub fn occurrence(recurring_transaction_id: i32, scheduled: NaiveDate) -> Self {
        Self {
            recurring_transaction_id: Some(recurring_transaction_id),
            occurrence_date: Some(scheduled),
            ..Default::default()
        }
    }
}

/// Writes notification rows stamped with the clock's local date and time.
///
/// Recording never deduplicates; see [`already_notified`]. Notices about an
/// installment or occurrence also leave a `notice_logs` entry, which outlives
/// the inbox row.
#[derive(Debug, Clone)]
pub struct NotificationRecorder {
    clock: Arc<dyn Clock>,
}

impl NotificationRecorder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    #[instrument(skip(self, db, message), fields(title = %message.title))]
    pub async fn record<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
        message: &PushMessage,
        links: NotificationLinks,
    ) -> Result<notification::Model> {
        let now = self.clock.now();

        let saved = notification::ActiveModel {
            user_id: Set(user_id),
            title: Set(message.title.clone()),
            message: Set(message.body.clone()),
            is_read: Set(false),
            debt_id: Set(links.debt_id),
            amortization_id: Set(links.amortization_id),
            recurring_transaction_id: Set(links.recurring_transaction_id),
            occurrence_date: Set(links.occurrence_date),
            date: Set(now.date_naive()),
            time: Set(now.time()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let tracked = links.amortization_id.is_some() || links.recurring_transaction_id.is_some();
        if let Some(occurrence_date) = links.occurrence_date.filter(|_| tracked) {
            notice_log::ActiveModel {
                user_id: Set(user_id),
                amortization_id: Set(links.amortization_id),
                recurring_transaction_id: Set(links.recurring_transaction_id),
                occurrence_date: Set(occurrence_date),
                sent_on: Set(now.date_naive()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        debug!("Recorded notification {} for user {}", saved.id, user_id);
        Ok(saved)
    }
}

/// Whether a notice about the same installment or occurrence was already sent to the user.
///
/// Looks at `notice_logs` rather than the inbox, so deleted notifications do
/// not re-arm a notice. Links without an installment or recurring
/// configuration never match.
pub async fn already_notified<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    links: &NotificationLinks,
) -> Result<bool> {
    let mut query = notice_log::Entity::find().filter(notice_log::Column::UserId.eq(user_id));

    query = match (links.amortization_id, links.recurring_transaction_id) {
        (Some(amortization_id), _) => {
            query.filter(notice_log::Column::AmortizationId.eq(amortization_id))
        }
        (None, Some(recurring_id)) => {
            query.filter(notice_log::Column::RecurringTransactionId.eq(recurring_id))
        }
        (None, None) => return Ok(false),
    };

    if let Some(occurrence) = links.occurrence_date {
        query = query.filter(notice_log::Column::OccurrenceDate.eq(occurrence));
    }

    Ok(query.count(db).await? > 0)
}
