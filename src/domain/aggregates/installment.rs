//! Installment plans: a monthly subscription that is cancelled once the
//! agreed number of charges has been collected.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub subscription_id: String,
    pub order_number: String,
    pub total_installments: u32,
    pub paid_installments: u32,
    pub status: PlanStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus { #[default] Active, Completed, Cancelled }

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Active => "active", Self::Completed => "completed", Self::Cancelled => "cancelled" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s { "active" => Some(Self::Active), "completed" => Some(Self::Completed), "cancelled" => Some(Self::Cancelled), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCharge {
    pub plan: InstallmentPlan,
    /// False when the invoice had been counted before (provider redelivery).
    pub newly_recorded: bool,
}

/// One successful invoice on an installment subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallmentCharge {
    pub invoice_id: String,
    pub subscription_id: String,
    pub order_number: String,
    pub total_installments: u32,
    pub amount_paid: i64,
}

impl InstallmentPlan {
    pub fn open(subscription_id: impl Into<String>, order_number: impl Into<String>, total_installments: u32) -> Self {
        Self {
            subscription_id: subscription_id.into(), order_number: order_number.into(),
            total_installments: total_installments.max(1), paid_installments: 0, status: PlanStatus::Active,
        }
    }

    pub fn apply_charge(&mut self) { self.paid_installments = self.paid_installments.saturating_add(1); }

    pub fn remaining(&self) -> u32 { self.total_installments.saturating_sub(self.paid_installments) }

    pub fn is_due_for_cancellation(&self) -> bool {
        self.status == PlanStatus::Active && self.paid_installments >= self.total_installments
    }

    pub fn complete(&mut self) { self.status = PlanStatus::Completed; }

    /// Returns false when the plan had already collected every charge, in
    /// which case it is marked completed instead.
    pub fn cancel(&mut self) -> bool {
        if self.status == PlanStatus::Completed || self.paid_installments >= self.total_installments {
            self.status = PlanStatus::Completed;
            return false;
        }
        self.status = PlanStatus::Cancelled;
        true
    }
}
