use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuditStamp, Audited, CompanyId, Entity};

wire_enum! {
    /// Lifecycle of an insured company.
    pub enum CompanyStatus: "company status" {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Suspended => "SUSPENDED",
    }
}

/// A client company; also the tenant for manager-role users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// ISO 3166 alpha-2, stored upper-case.
    pub country_code: String,
    pub email: Option<String>,
    pub status: CompanyStatus,
    #[serde(default)]
    pub stamp: AuditStamp,
}

impl Company {
    pub fn new(id: CompanyId, name: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            country_code: country_code.into().trim().to_uppercase(),
            email: None,
            status: CompanyStatus::Active,
            stamp: AuditStamp::default(),
        }
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Audited for Company {
    const ENTITY_TYPE: &'static str = "company";

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

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::ActorId;

    #[test]
    fn country_code_is_normalised_on_construction() {
        let company = Company::new(CompanyId::new(), "Acme", " de ");
        assert_eq!(company.country_code, "DE");
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("active".parse::<CompanyStatus>().unwrap(), CompanyStatus::Active);
        assert_eq!(" SUSPENDED ".parse::<CompanyStatus>().unwrap(), CompanyStatus::Suspended);
        assert!("ACTIVATED".parse::<CompanyStatus>().is_err());
    }

    #[test]
    fn same_state_ignores_stamps() {
        let a = Company::new(CompanyId::new(), "Acme", "NL");
        let mut b = a.clone();
        b.stamp = AuditStamp::created(ActorId::new(), Utc::now());
        assert!(a.same_state(&b));

        b.name = "Acme Holding".to_string();
        assert!(!a.same_state(&b));
    }
}
