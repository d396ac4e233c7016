use model::entities::prelude::*;
use model::entities::{notice_log, recurring_transaction};
use sea_orm_migration::prelude::*;

use crate::entity_iden::EntityIden;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The scheduler scans active configurations on every tick
        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_transactions_active_next")
                    .table(RecurringTransaction::table())
                    .col(RecurringTransaction::column(recurring_transaction::Column::IsActive))
                    .col(RecurringTransaction::column(
                        recurring_transaction::Column::NextExecutionDate,
                    ))
                    .to_owned(),
            )
            .await?;

        // Duplicate checks look notices up by user and occurrence
        manager
            .create_index(
                Index::create()
                    .name("idx_notice_logs_user_occurrence")
                    .table(NoticeLog::table())
                    .col(NoticeLog::column(notice_log::Column::UserId))
                    .col(NoticeLog::column(notice_log::Column::OccurrenceDate))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_notice_logs_user_occurrence")
                    .table(NoticeLog::table())
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_recurring_transactions_active_next")
                    .table(RecurringTransaction::table())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
