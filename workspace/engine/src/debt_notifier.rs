//! Advance notice for upcoming debt installments.

use std::collections::HashMap;
use std::sync::Arc;

use common::dates::format_date;
use common::{Clock, PushMessage, TickReport};
use model::entities::{amortization, debt, debt::PaymentStatus};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, error, info, instrument, trace};

use crate::audience::{UserAudience, load_audiences};
use crate::error::Result;
use crate::options::EngineOptions;
use crate::push::PushGateway;
use crate::recorder::{NotificationLinks, NotificationRecorder, already_notified};

/// Sends one notice per pending installment whose notify date is today.
///
/// Debt and installment state is only read here, never written.
#[derive(Debug, Clone)]
pub struct DebtDueDateNotifier {
    push: Arc<dyn PushGateway>,
    clock: Arc<dyn Clock>,
    recorder: NotificationRecorder,
    options: EngineOptions,
}

impl DebtDueDateNotifier {
    pub fn new(push: Arc<dyn PushGateway>, clock: Arc<dyn Clock>, options: EngineOptions) -> Self {
        Self {
            push,
            recorder: NotificationRecorder::new(clock.clone()),
            clock,
            options,
        }
    }

    #[instrument(skip(self, db))]
    pub async fn run(&self, db: &DatabaseConnection) -> Result<TickReport> {
        let today = self.clock.today();
        let audiences = load_audiences(db).await?;
        let mut report = TickReport::default();

        info!(
            "Checking debt installments for {} users on {}",
            audiences.len(),
            today
        );

        for audience in audiences.values() {
            report.users_scanned += 1;
            match self.notify_user(db, audience).await {
                Ok(user_report) => report.absorb(&user_report),
                Err(e) => {
                    error!("Debt notices for user {} failed: {}", audience.user_id, e);
                    report.failures += 1;
                }
            }
        }

        info!(
            "Debt notifier recorded {} notifications, skipped {}, {} pushes delivered, {} failed",
            report.notifications_recorded,
            report.notifications_skipped,
            report.pushes_delivered,
            report.pushes_failed
        );
        Ok(report)
    }

    async fn notify_user(&self, db: &DatabaseConnection, audience: &UserAudience) -> Result<TickReport> {
        let today = self.clock.today();
        let mut report = TickReport::default();

        let debts: HashMap<i32, debt::Model> = debt::Entity::find()
            .filter(debt::Column::UserId.eq(audience.user_id))
            .filter(debt::Column::Status.eq(PaymentStatus::Pending))
            .all(db)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        if debts.is_empty() {
            trace!("User {} has no pending debts", audience.user_id);
            return Ok(report);
        }

        let installments = amortization::Entity::find()
            .filter(amortization::Column::DebtId.is_in(debts.keys().copied()))
            .filter(amortization::Column::Status.eq(PaymentStatus::Pending))
            .order_by_asc(amortization::Column::Date)
            .order_by_asc(amortization::Column::Id)
            .all(db)
            .await?;

        for installment in installments {
            if !self
                .options
                .missed_occurrences
                .notice_due(installment.date, audience.lead_days, today)
            {
                continue;
            }
            let Some(debt) = debts.get(&installment.debt_id) else {
                continue;
            };

            let links = NotificationLinks::installment(debt.id, installment.id, installment.date);
            if already_notified(db, audience.user_id, &links).await? {
                debug!(
                    "Installment {} of debt {} already notified",
                    installment.id, debt.id
                );
                report.notifications_skipped += 1;
                continue;
            }

            let message = installment_message(debt, &installment).with_icon(&self.options.icon);
            self.recorder
                .record(db, audience.user_id, &message, links)
                .await?;
            report.notifications_recorded += 1;

            let outcome = audience.deliver(self.push.as_ref(), &message).await;
            report.pushes_delivered += outcome.delivered;
            report.pushes_failed += outcome.failed;
        }

        Ok(report)
    }
}

pub fn installment_message(debt: &debt::Model, installment: &amortization::Model) -> PushMessage {
    PushMessage::new(
        format!("Upcoming payment: {}", debt.name),
        format!(
            "Installment #{} of {:.2} is due on {}",
            installment.number_months,
            installment.quota,
            format_date(installment.date)
        ),
    )
}
