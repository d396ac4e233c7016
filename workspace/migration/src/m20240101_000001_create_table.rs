use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string_null(Users::Email))
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(integer(Categories::UserId))
                    .col(string(Categories::Name))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_user")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create transactions table
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(integer(Transactions::CategoryId))
                    .col(string(Transactions::Name))
                    .col(string_null(Transactions::Description))
                    .col(decimal(Transactions::Amount).decimal_len(16, 4))
                    .col(date(Transactions::Date))
                    .col(time(Transactions::Time))
                    .col(boolean(Transactions::IsRecurring).default(false))
                    .col(string_null(Transactions::ReceiptKey))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_category")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recurring_transactions table
        manager
            .create_table(
                Table::create()
                    .table(RecurringTransactions::Table)
                    .if_not_exists()
                    .col(pk_auto(RecurringTransactions::Id))
                    .col(integer(RecurringTransactions::TransactionId).unique_key())
                    .col(string(RecurringTransactions::Frequency).string_len(10))
                    .col(date(RecurringTransactions::NextExecutionDate))
                    .col(date_null(RecurringTransactions::EndDate))
                    .col(integer_null(RecurringTransactions::DayOfMonth))
                    .col(integer_null(RecurringTransactions::DayOfWeek))
                    .col(boolean(RecurringTransactions::IsActive).default(true))
                    .col(date_null(RecurringTransactions::LastExecuted))
                    .col(integer(RecurringTransactions::GeneratedTransactions).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_transactions_transaction")
                            .from(RecurringTransactions::Table, RecurringTransactions::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create debts table
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(pk_auto(Debts::Id))
                    .col(integer(Debts::UserId))
                    .col(string(Debts::Name))
                    .col(decimal(Debts::Amount).decimal_len(16, 4))
                    .col(decimal(Debts::InterestRate).decimal_len(8, 4))
                    .col(integer(Debts::DurationMonths))
                    .col(string(Debts::Status).string_len(10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_user")
                            .from(Debts::Table, Debts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create amortizations table
        manager
            .create_table(
                Table::create()
                    .table(Amortizations::Table)
                    .if_not_exists()
                    .col(pk_auto(Amortizations::Id))
                    .col(integer(Amortizations::DebtId))
                    .col(integer(Amortizations::NumberMonths))
                    .col(date(Amortizations::Date))
                    .col(decimal(Amortizations::Quota).decimal_len(16, 4))
                    .col(decimal(Amortizations::Interest).decimal_len(16, 4))
                    .col(decimal(Amortizations::Amortized).decimal_len(16, 4))
                    .col(decimal(Amortizations::Outstanding).decimal_len(16, 4))
                    .col(string(Amortizations::Status).string_len(10))
                    .col(date_null(Amortizations::PaymentDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_amortizations_debt")
                            .from(Amortizations::Table, Amortizations::DebtId)
                            .to(Debts::Table, Debts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create devices table
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(pk_auto(Devices::Id))
                    .col(integer(Devices::UserId))
                    .col(string(Devices::Name))
                    .col(date_time(Devices::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_devices_user")
                            .from(Devices::Table, Devices::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notification_preferences table
        manager
            .create_table(
                Table::create()
                    .table(NotificationPreferences::Table)
                    .if_not_exists()
                    .col(pk_auto(NotificationPreferences::Id))
                    .col(integer(NotificationPreferences::DeviceId))
                    .col(boolean(NotificationPreferences::PushEnabled).default(true))
                    .col(text(NotificationPreferences::Subscription))
                    .col(integer_null(NotificationPreferences::DaysBeforeNotify))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_preferences_device")
                            .from(NotificationPreferences::Table, NotificationPreferences::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notifications table
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_auto(Notifications::Id))
                    .col(integer(Notifications::UserId))
                    .col(string(Notifications::Title))
                    .col(text(Notifications::Message))
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(integer_null(Notifications::DebtId))
                    .col(integer_null(Notifications::AmortizationId))
                    .col(integer_null(Notifications::RecurringTransactionId))
                    .col(date_null(Notifications::OccurrenceDate))
                    .col(date(Notifications::Date))
                    .col(time(Notifications::Time))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_debt")
                            .from(Notifications::Table, Notifications::DebtId)
                            .to(Debts::Table, Debts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_recurring_transaction")
                            .from(Notifications::Table, Notifications::RecurringTransactionId)
                            .to(RecurringTransactions::Table, RecurringTransactions::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notice_logs table
        manager
            .create_table(
                Table::create()
                    .table(NoticeLogs::Table)
                    .if_not_exists()
                    .col(pk_auto(NoticeLogs::Id))
                    .col(integer(NoticeLogs::UserId))
                    .col(integer_null(NoticeLogs::AmortizationId))
                    .col(integer_null(NoticeLogs::RecurringTransactionId))
                    .col(date(NoticeLogs::OccurrenceDate))
                    .col(date(NoticeLogs::SentOn))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notice_logs_user")
                            .from(NoticeLogs::Table, NoticeLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notice_logs_amortization")
                            .from(NoticeLogs::Table, NoticeLogs::AmortizationId)
                            .to(Amortizations::Table, Amortizations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notice_logs_recurring_transaction")
                            .from(NoticeLogs::Table, NoticeLogs::RecurringTransactionId)
                            .to(RecurringTransactions::Table, RecurringTransactions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(NoticeLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(NotificationPreferences::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Amortizations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RecurringTransactions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    CategoryId,
    Name,
    Description,
    Amount,
    Date,
    Time,
    IsRecurring,
    ReceiptKey,
}

#[derive(DeriveIden)]
enum RecurringTransactions {
    Table,
    Id,
    TransactionId,
    Frequency,
    NextExecutionDate,
    EndDate,
    DayOfMonth,
    DayOfWeek,
    IsActive,
    LastExecuted,
    GeneratedTransactions,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
    UserId,
    Name,
    Amount,
    InterestRate,
    DurationMonths,
    Status,
}

#[derive(DeriveIden)]
enum Amortizations {
    Table,
    Id,
    DebtId,
    NumberMonths,
    Date,
    Quota,
    Interest,
    Amortized,
    Outstanding,
    Status,
    PaymentDate,
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    UserId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum NotificationPreferences {
    Table,
    Id,
    DeviceId,
    PushEnabled,
    Subscription,
    DaysBeforeNotify,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Title,
    Message,
    IsRead,
    DebtId,
    AmortizationId,
    RecurringTransactionId,
    OccurrenceDate,
    Date,
    Time,
}

#[derive(DeriveIden)]
enum NoticeLogs {
    Table,
    Id,
    UserId,
    AmortizationId,
    RecurringTransactionId,
    OccurrenceDate,
    SentOn,
}
