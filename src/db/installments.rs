use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::aggregates::{InstallmentCharge, InstallmentPlan, PlanStatus, RecordedCharge};
use crate::error::Result;
use crate::ports::InstallmentStore;

#[derive(sqlx::FromRow)]
struct PlanRow {
    subscription_id: String,
    order_number: String,
    total_installments: i32,
    paid_installments: i32,
    status: String,
}

impl From<PlanRow> for InstallmentPlan {
    fn from(r: PlanRow) -> Self {
        Self {
            subscription_id: r.subscription_id,
            order_number: r.order_number,
            total_installments: r.total_installments.max(0) as u32,
            paid_installments: r.paid_installments.max(0) as u32,
            status: PlanStatus::parse(&r.status).unwrap_or_default(),
        }
    }
}

const SELECT_PLAN: &str = "SELECT subscription_id, order_number, total_installments, paid_installments, status FROM installment_plans WHERE subscription_id = $1";

#[derive(Clone)]
pub struct PgInstallmentStore {
    db: PgPool,
}

impl PgInstallmentStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl InstallmentStore for PgInstallmentStore {
    async fn record_charge(&self, charge: &InstallmentCharge) -> Result<RecordedCharge> {
        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT INTO installment_plans (subscription_id, order_number, total_installments, paid_installments, status, created_at, updated_at) VALUES ($1, $2, $3, 0, 'active', NOW(), NOW()) ON CONFLICT (subscription_id) DO NOTHING")
            .bind(&charge.subscription_id).bind(&charge.order_number).bind(charge.total_installments as i32)
            .execute(&mut *tx).await?;

        let newly_recorded = sqlx::query("INSERT INTO installment_charges (invoice_id, subscription_id, amount_paid, created_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT (invoice_id) DO NOTHING")
            .bind(&charge.invoice_id).bind(&charge.subscription_id).bind(charge.amount_paid)
            .execute(&mut *tx).await?
            .rows_affected() == 1;

        if newly_recorded {
            sqlx::query("UPDATE installment_plans SET paid_installments = paid_installments + 1, updated_at = NOW() WHERE subscription_id = $1")
                .bind(&charge.subscription_id)
                .execute(&mut *tx).await?;
        }

        let plan = sqlx::query_as::<_, PlanRow>(SELECT_PLAN).bind(&charge.subscription_id).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        tracing::debug!(invoice_id = %charge.invoice_id, subscription_id = %charge.subscription_id, newly_recorded, "installment charge stored");
        Ok(RecordedCharge { plan: plan.into(), newly_recorded })
    }

    async fn find(&self, subscription_id: &str) -> Result<Option<InstallmentPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(SELECT_PLAN).bind(subscription_id).fetch_optional(&self.db).await?;
        Ok(row.map(Into::into))
    }

    async fn save_status(&self, plan: &InstallmentPlan) -> Result<()> {
        sqlx::query("UPDATE installment_plans SET status = $2, updated_at = NOW() WHERE subscription_id = $1")
            .bind(&plan.subscription_id).bind(plan.status.as_str())
            .execute(&self.db).await?;
        Ok(())
    }
}
