use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuditStamp, Audited, ClaimId, CompanyId, Entity, UserId};

wire_enum! {
    /// Processing state of a claim.
    pub enum ClaimStatus: "claim status" {
        Submitted => "SUBMITTED",
        InReview => "IN_REVIEW",
        Approved => "APPROVED",
        Denied => "DENIED",
        Paid => "PAID",
    }
}

/// A reimbursement claim filed by a consumer under their employer's package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub company_id: CompanyId,
    /// The consumer the claim is filed for.
    pub user_id: UserId,
    pub status: ClaimStatus,
    pub service_date: NaiveDate,
    pub amount_cents: i64,
    pub description: String,
    #[serde(default)]
    pub stamp: AuditStamp,
}

impl Claim {
    pub fn new(
        id: ClaimId,
        company_id: CompanyId,
        user_id: UserId,
        service_date: NaiveDate,
        amount_cents: i64,
    ) -> Self {
        Self {
            id,
            company_id,
            user_id,
            status: ClaimStatus::Submitted,
            service_date,
            amount_cents,
            description: String::new(),
            stamp: AuditStamp::default(),
        }
    }
}

impl Entity for Claim {
    type Id = ClaimId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Audited for Claim {
    const ENTITY_TYPE: &'static str = "claim";

    fn key(&self) -> Uuid {
        self.id.into()
    }

    fn stamp(&self) -> &AuditStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut AuditStamp {
        &mut self.stamp
    }
}
