//! Installment payments and the debt status derived from them.

use chrono::NaiveDate;
use model::entities::{amortization, debt, debt::PaymentStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{info, instrument};

use crate::error::{EngineError, Result};

/// Status a debt should have given its installments.
///
/// A debt without installments stays pending.
pub fn derive_status(installments: &[amortization::Model]) -> PaymentStatus {
    if !installments.is_empty() && installments.iter().all(|i| i.status == PaymentStatus::Paid) {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

/// Recomputes a debt's status from all of its installments.
#[instrument(skip(db))]
pub async fn refresh_debt_status<C: ConnectionTrait>(db: &C, debt_id: i32) -> Result<debt::Model> {
    let debt = debt::Entity::find_by_id(debt_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Debt", debt_id))?;
    let installments = amortization::Entity::find()
        .filter(amortization::Column::DebtId.eq(debt_id))
        .all(db)
        .await?;

    let status = derive_status(&installments);
    if debt.status == status {
        return Ok(debt);
    }

    let mut model: debt::ActiveModel = debt.into();
    model.status = Set(status);
    let updated = model.update(db).await?;
    info!("Debt {} is now {:?}", debt_id, status);
    Ok(updated)
}

/// Marks an installment of one of the user's debts as paid and refreshes the debt.
#[instrument(skip(db))]
pub async fn mark_installment_paid(
    db: &DatabaseConnection,
    user_id: i32,
    amortization_id: i32,
    payment_date: NaiveDate,
) -> Result<(amortization::Model, debt::Model)> {
    let (installment, debt) = amortization::Entity::find_by_id(amortization_id)
        .find_also_related(debt::Entity)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Amortization", amortization_id))?;
    match debt {
        Some(debt) if debt.user_id == user_id => {}
        _ => return Err(EngineError::ownership("Amortization", amortization_id, user_id)),
    }
    if installment.status == PaymentStatus::Paid {
        return Err(EngineError::Conflict(format!(
            "installment {amortization_id} is already paid"
        )));
    }

    let debt_id = installment.debt_id;
    let txn = db.begin().await?;
    let mut model: amortization::ActiveModel = installment.into();
    model.status = Set(PaymentStatus::Paid);
    model.payment_date = Set(Some(payment_date));
    let paid = model.update(&txn).await?;
    let debt = refresh_debt_status(&txn, debt_id).await?;
    txn.commit().await?;

    Ok((paid, debt))
}
