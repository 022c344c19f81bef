use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuditStamp, Audited, CompanyId, Entity, UserId};

wire_enum! {
    /// Account status of a back-office user.
    pub enum UserStatus: "user status" {
        Invited => "INVITED",
        Active => "ACTIVE",
        Disabled => "DISABLED",
    }
}

wire_enum! {
    /// Functions a user holds; mirrored into the identity provider as roles.
    pub enum UserFunction: "user function" {
        ApplicationAdmin => "APPLICATION_ADMIN",
        CompanyManager => "COMPANY_MANAGER",
        UserManager => "USER_MANAGER",
        ClaimManager => "CLAIM_MANAGER",
        Consumer => "CONSUMER",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Absent for application administrators.
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub email: String,
    pub ssn: Option<String>,
    pub status: UserStatus,
    pub functions: BTreeSet<UserFunction>,
    #[serde(default)]
    pub stamp: AuditStamp,
}

impl User {
    pub fn new(
        id: UserId,
        company_id: Option<CompanyId>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            company_id,
            name: name.into(),
            email: email.into(),
            ssn: None,
            status: UserStatus::Invited,
            functions: BTreeSet::new(),
            stamp: AuditStamp::default(),
        }
    }

    pub fn with_functions(mut self, functions: impl IntoIterator<Item = UserFunction>) -> Self {
        self.functions.extend(functions);
        self
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Audited for User {
    const ENTITY_TYPE: &'static str = "user";

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
