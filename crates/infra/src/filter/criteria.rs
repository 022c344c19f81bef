//! Criteria → predicate.
//!
//! Each present criterion contributes exactly one sub-predicate; absent or
//! blank criteria contribute nothing; the result is their conjunction.

use core::fmt::Display;
use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use backoffice_core::{
    Claim, ClaimFilter, ClaimStatus, Company, CompanyFilter, CompanyStatus, DateRange, User,
    UserFilter, UserStatus,
};

use super::predicate::{FieldValue, Predicate};
use super::record::{Record, fields};

/// Search criteria that compile to a predicate over one record type.
pub trait Criteria {
    type Target: Record;

    fn to_predicate(&self) -> Predicate<Self::Target>;
}

/// Build the predicate for `criteria`.
pub fn build<C: Criteria>(criteria: &C) -> Predicate<C::Target> {
    criteria.to_predicate()
}

/// Accumulates sub-predicates for the criteria that are present.
pub struct PredicateBuilder<T> {
    predicate: Predicate<T>,
}

impl<T> Default for PredicateBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PredicateBuilder<T> {
    pub fn new() -> Self {
        Self {
            predicate: Predicate::always(),
        }
    }

    fn push(mut self, predicate: Predicate<T>) -> Self {
        self.predicate = self.predicate.and(predicate);
        self
    }

    /// Case-insensitive substring match on a non-blank value. The needle is
    /// used as given, surrounding whitespace included.
    pub fn contains(self, field: &'static str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(needle) => self.push(Predicate::contains(field, needle)),
            None => self,
        }
    }

    /// Equality against the upper-cased value (codes stored upper-case).
    pub fn equals_upper(self, field: &'static str, value: Option<&str>) -> Self {
        match non_blank(value) {
            Some(code) => self.push(Predicate::equals(field, code.to_uppercase())),
            None => self,
        }
    }

    pub fn equals_id(self, field: &'static str, value: Option<impl Into<Uuid>>) -> Self {
        match value {
            Some(id) => self.push(Predicate::equals(field, FieldValue::Uuid(id.into()))),
            None => self,
        }
    }

    /// Enum match. A value naming no member of `E` matches nothing.
    pub fn enum_equals<E>(self, field: &'static str, value: Option<&str>) -> Self
    where
        E: FromStr + Display,
    {
        let Some(raw) = non_blank(value) else {
            return self;
        };
        match raw.parse::<E>() {
            Ok(parsed) => self.push(Predicate::equals(field, parsed.to_string())),
            Err(_) => {
                tracing::debug!(field, value = raw, "unknown enum value in filter; matching nothing");
                self.push(Predicate::never())
            }
        }
    }

    pub fn range<V>(self, field: &'static str, range: &DateRange<V>) -> Self
    where
        V: Into<FieldValue> + Copy,
    {
        let mut builder = self;
        if let Some(from) = range.from {
            builder = builder.push(Predicate::at_least(field, from));
        }
        if let Some(to) = range.to {
            builder = builder.push(Predicate::at_most(field, to));
        }
        builder
    }

    /// Membership through a to-many relation; an empty set adds nothing.
    pub fn member_of<I>(self, relation: &'static str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        if values.is_empty() {
            self
        } else {
            self.push(Predicate::member_of(relation, values))
        }
    }

    pub fn build(self) -> Predicate<T> {
        self.predicate
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn timestamps<T>(
    builder: PredicateBuilder<T>,
    created: &DateRange<DateTime<Utc>>,
    updated: Option<&DateRange<DateTime<Utc>>>,
) -> PredicateBuilder<T> {
    let builder = builder.range(fields::CREATED_AT, created);
    match updated {
        Some(updated) => builder.range(fields::UPDATED_AT, updated),
        None => builder,
    }
}

impl Criteria for CompanyFilter {
    type Target = Company;

    fn to_predicate(&self) -> Predicate<Company> {
        let builder = PredicateBuilder::new()
            .equals_id(fields::ID, self.id)
            .contains(fields::NAME, self.name.as_deref())
            .equals_upper(fields::COUNTRY_CODE, self.country_code.as_deref())
            .contains(fields::EMAIL, self.email.as_deref())
            .enum_equals::<CompanyStatus>(fields::STATUS, self.status.as_deref());
        timestamps(builder, &self.created, Some(&self.updated)).build()
    }
}

impl Criteria for UserFilter {
    type Target = User;

    fn to_predicate(&self) -> Predicate<User> {
        let builder = PredicateBuilder::new()
            .equals_id(fields::COMPANY_ID, self.company_id)
            .equals_id(fields::ID, self.user_id)
            .contains(fields::NAME, self.name.as_deref())
            .contains(fields::EMAIL, self.email.as_deref())
            .contains(fields::SSN, self.ssn.as_deref())
            .enum_equals::<UserStatus>(fields::STATUS, self.status.as_deref())
            .member_of(fields::FUNCTIONS, self.functions.iter());
        timestamps(builder, &self.created, Some(&self.updated)).build()
    }
}

impl Criteria for ClaimFilter {
    type Target = Claim;

    fn to_predicate(&self) -> Predicate<Claim> {
        let builder = PredicateBuilder::new()
            .equals_id(fields::COMPANY_ID, self.company_id)
            .equals_id(fields::USER_ID, self.user_id)
            .enum_equals::<ClaimStatus>(fields::STATUS, self.status.as_deref())
            .range::<NaiveDate>(fields::SERVICE_DATE, &self.service_date);
        timestamps(builder, &self.created, None).build()
    }
}
