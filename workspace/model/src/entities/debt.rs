use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Payment state shared by debts and their installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pendiente")]
    Pending,
    #[sea_orm(string_value = "Pagado")]
    Paid,
}

/// A loan or other debt repaid through an amortization schedule.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    /// Principal.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// Annual interest rate in percent.
    #[sea_orm(column_type = "Decimal(Some((8, 4)))")]
    pub interest_rate: Decimal,
    pub duration_months: i32,
    /// `Paid` exactly when every installment is paid.
    pub status: PaymentStatus,
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
    #[sea_orm(has_many = "super::amortization::Entity")]
    Amortization,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::amortization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Amortization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
