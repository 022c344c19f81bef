//! Search criteria accepted by list endpoints.
//!
//! Every field is optional; an absent field does not restrict the result set.
//! Status fields are kept as the raw client string so that a malformed value
//! can be turned into an empty result instead of a request error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{CompanyId, UserFunction, UserId};

/// Inclusive range with independently optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange<T> {
    pub from: Option<T>,
    pub to: Option<T>,
}

impl<T> Default for DateRange<T> {
    fn default() -> Self {
        Self { from: None, to: None }
    }
}

impl<T> DateRange<T> {
    pub fn between(from: T, to: T) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn since(from: T) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn until(to: T) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyFilter {
    /// Restricts the search to a single company; set by tenant scoping.
    pub id: Option<CompanyId>,
    pub name: Option<String>,
    pub country_code: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub created: DateRange<DateTime<Utc>>,
    pub updated: DateRange<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub ssn: Option<String>,
    pub status: Option<String>,
    /// Matches users holding at least one of these functions.
    pub functions: Vec<UserFunction>,
    pub created: DateRange<DateTime<Utc>>,
    pub updated: DateRange<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimFilter {
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub status: Option<String>,
    pub service_date: DateRange<NaiveDate>,
    pub created: DateRange<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_to_an_empty_filter() {
        let filter: ClaimFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, ClaimFilter::default());
        assert!(filter.service_date.is_unbounded());
    }

    #[test]
    fn half_open_ranges_keep_the_present_bound() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let range = DateRange::since(day);
        assert_eq!(range.from, Some(day));
        assert!(range.to.is_none());
        assert!(!range.is_unbounded());
    }
}
