use chrono::{NaiveDate, NaiveTime};
use sea_orm::entity::prelude::*;

/// A message recorded for a user, optionally tied to what triggered it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(default_value = "false")]
    pub is_read: bool,
    pub debt_id: Option<i32>,
    pub amortization_id: Option<i32>,
    pub recurring_transaction_id: Option<i32>,
    /// Due date of the installment or occurrence the notice is about.
    pub occurrence_date: Option<NaiveDate>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::debt::Entity",
        from = "Column::DebtId",
        to = "super::debt::Column::Id",
        on_delete = "SetNull"
    )]
    Debt,
    #[sea_orm(
        belongs_to = "super::recurring_transaction::Entity",
        from = "Column::RecurringTransactionId",
        to = "super::recurring_transaction::Column::Id",
        on_delete = "SetNull"
    )]
    RecurringTransaction,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::debt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debt.def()
    }
}

impl Related<super::recurring_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
