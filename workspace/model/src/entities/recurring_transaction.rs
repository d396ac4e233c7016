use std::str::FromStr;

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum RecurrenceFrequency {
    #[sea_orm(string_value = "Daily")]
    Daily,
    #[sea_orm(string_value = "Weekly")]
    Weekly,
    #[sea_orm(string_value = "Biweekly")]
    Biweekly,
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    #[sea_orm(string_value = "Yearly")]
    Yearly,
}

impl FromStr for RecurrenceFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(format!("unknown recurrence frequency '{}'", other)),
        }
    }
}

/// Schedule metadata attached to exactly one template transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The template transaction. One configuration per transaction.
    #[sea_orm(unique)]
    pub transaction_id: i32,
    pub frequency: RecurrenceFrequency,
    /// The next date an occurrence is due. Always advanced past today once fired.
    pub next_execution_date: NaiveDate,
    /// Inclusive upper bound for occurrences.
    pub end_date: Option<NaiveDate>,
    /// Anchor day for monthly schedules (1-31).
    pub day_of_month: Option<i32>,
    /// Reserved for weekly schedules; not used when advancing dates.
    pub day_of_week: Option<i32>,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub last_executed: Option<NaiveDate>,
    #[sea_orm(default_value = "0")]
    pub generated_transactions: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction::Entity",
        from = "Column::TransactionId",
        to = "super::transaction::Column::Id",
        on_delete = "Cascade"
    )]
    Transaction,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
