//! Field-level view of the stored entities.
//!
//! Field names double as column names in the relational schema.

use backoffice_core::{Audited, Claim, Company, User};

use super::predicate::FieldValue;

/// Join table backing a to-many relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub table: &'static str,
    /// Column in `table` referencing the owning row's `id`.
    pub foreign_key: &'static str,
    /// Column in `table` holding the related value.
    pub column: &'static str,
}

/// A row that predicates can be evaluated against.
pub trait Record {
    const TABLE: &'static str;

    /// Value of `field`; unknown fields read as [`FieldValue::Null`].
    fn field(&self, name: &str) -> FieldValue;

    /// Values held through a to-many relation.
    fn related(&self, _relation: &str) -> Vec<String> {
        Vec::new()
    }

    /// Join table for a relation name.
    fn relation(_name: &str) -> Option<Relation> {
        None
    }
}

pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const SSN: &str = "ssn";
    pub const STATUS: &str = "status";
    pub const COUNTRY_CODE: &str = "country_code";
    pub const COMPANY_ID: &str = "company_id";
    pub const USER_ID: &str = "user_id";
    pub const SERVICE_DATE: &str = "service_date";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";

    /// Relation from a user to the functions it holds.
    pub const FUNCTIONS: &str = "functions";
}

use fields::*;

const USER_FUNCTIONS: Relation = Relation {
    table: "user_functions",
    foreign_key: "user_id",
    column: "function",
};

fn stamp_field<E: Audited>(entity: &E, name: &str) -> Option<FieldValue> {
    match name {
        CREATED_AT => Some(entity.stamp().created_at.into()),
        UPDATED_AT => Some(entity.stamp().updated_at.into()),
        _ => None,
    }
}

impl Record for Company {
    const TABLE: &'static str = "companies";

    fn field(&self, name: &str) -> FieldValue {
        match name {
            ID => (*self.id.as_uuid()).into(),
            NAME => self.name.as_str().into(),
            COUNTRY_CODE => self.country_code.as_str().into(),
            EMAIL => self.email.clone().into(),
            STATUS => self.status.as_str().into(),
            other => stamp_field(self, other).unwrap_or(FieldValue::Null),
        }
    }
}

impl Record for User {
    const TABLE: &'static str = "users";

    fn field(&self, name: &str) -> FieldValue {
        match name {
            ID => (*self.id.as_uuid()).into(),
            COMPANY_ID => self.company_id.map(uuid::Uuid::from).into(),
            NAME => self.name.as_str().into(),
            EMAIL => self.email.as_str().into(),
            SSN => self.ssn.clone().into(),
            STATUS => self.status.as_str().into(),
            other => stamp_field(self, other).unwrap_or(FieldValue::Null),
        }
    }

    fn related(&self, relation: &str) -> Vec<String> {
        match relation {
            FUNCTIONS => self.functions.iter().map(|f| f.as_str().to_string()).collect(),
            _ => Vec::new(),
        }
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            FUNCTIONS => Some(USER_FUNCTIONS),
            _ => None,
        }
    }
}

impl Record for Claim {
    const TABLE: &'static str = "claims";

    fn field(&self, name: &str) -> FieldValue {
        match name {
            ID => (*self.id.as_uuid()).into(),
            COMPANY_ID => (*self.company_id.as_uuid()).into(),
            USER_ID => (*self.user_id.as_uuid()).into(),
            STATUS => self.status.as_str().into(),
            SERVICE_DATE => self.service_date.into(),
            other => stamp_field(self, other).unwrap_or(FieldValue::Null),
        }
    }
}
