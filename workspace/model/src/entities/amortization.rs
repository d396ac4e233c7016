use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::debt::PaymentStatus;

/// One scheduled installment of a debt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "amortizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub debt_id: i32,
    /// 1-based installment index.
    pub number_months: i32,
    /// Due date.
    pub date: NaiveDate,
    /// Total payment for the installment.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quota: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub interest: Decimal,
    /// Principal repaid by this installment.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amortized: Decimal,
    /// Remaining principal after this installment.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub outstanding: Decimal,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::debt::Entity",
        from = "Column::DebtId",
        to = "super::debt::Column::Id",
        on_delete = "Cascade"
    )]
    Debt,
}

impl Related<super::debt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
