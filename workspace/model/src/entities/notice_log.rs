use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// Marks an installment or recurring occurrence as already announced to a user.
///
/// Kept apart from `notifications` so clearing a user's inbox does not re-arm notices.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notice_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub amortization_id: Option<i32>,
    pub recurring_transaction_id: Option<i32>,
    pub occurrence_date: NaiveDate,
    pub sent_on: NaiveDate,
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
        belongs_to = "super::amortization::Entity",
        from = "Column::AmortizationId",
        to = "super::amortization::Column::Id",
        on_delete = "Cascade"
    )]
    Amortization,
    #[sea_orm(
        belongs_to = "super::recurring_transaction::Entity",
        from = "Column::RecurringTransactionId",
        to = "super::recurring_transaction::Column::Id",
        on_delete = "Cascade"
    )]
    RecurringTransaction,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
