//! Typed, composable query predicates.
//!
//! A [`Predicate<T>`] is a condition tree addressed by field name. The same
//! tree is evaluated in memory (see [`Predicate::matches`]) and rendered to
//! SQL (see [`crate::filter::sql`]), so both paths share one definition of
//! what a filter means.

use std::cmp::Ordering;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::record::Record;

/// A column value as seen by predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl FieldValue {
    fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Condition {
    Always,
    Never,
    /// Case-insensitive substring; `needle` is stored lower-cased.
    Contains { field: &'static str, needle: String },
    Equals { field: &'static str, value: FieldValue },
    AtLeast { field: &'static str, bound: FieldValue },
    AtMost { field: &'static str, bound: FieldValue },
    /// At least one related row holds one of `values`.
    MemberOf { relation: &'static str, values: Vec<String> },
    All(Vec<Condition>),
}

impl Condition {
    fn and(self, other: Condition) -> Condition {
        match (self, other) {
            (Condition::Never, _) | (_, Condition::Never) => Condition::Never,
            (Condition::Always, c) | (c, Condition::Always) => c,
            (Condition::All(mut left), Condition::All(right)) => {
                left.extend(right);
                Condition::All(left)
            }
            (Condition::All(mut left), c) => {
                left.push(c);
                Condition::All(left)
            }
            (c, Condition::All(mut right)) => {
                right.insert(0, c);
                Condition::All(right)
            }
            (a, b) => Condition::All(vec![a, b]),
        }
    }

    fn eval<T: Record>(&self, record: &T) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Contains { field, needle } => match record.field(field) {
                FieldValue::Text(text) => text.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
            Condition::Equals { field, value } => &record.field(field) == value,
            Condition::AtLeast { field, bound } => matches!(
                record.field(field).compare(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::AtMost { field, bound } => matches!(
                record.field(field).compare(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::MemberOf { relation, values } => record
                .related(relation)
                .iter()
                .any(|held| values.contains(held)),
            Condition::All(conditions) => conditions.iter().all(|c| c.eval(record)),
        }
    }
}

/// Condition over records of type `T`.
pub struct Predicate<T> {
    condition: Condition,
    _target: PhantomData<fn(&T) -> bool>,
}

impl<T> Predicate<T> {
    fn from_condition(condition: Condition) -> Self {
        Self {
            condition,
            _target: PhantomData,
        }
    }

    /// Matches every record.
    pub fn always() -> Self {
        Self::from_condition(Condition::Always)
    }

    /// Matches no record.
    pub fn never() -> Self {
        Self::from_condition(Condition::Never)
    }

    pub fn contains(field: &'static str, needle: &str) -> Self {
        Self::from_condition(Condition::Contains {
            field,
            needle: needle.to_lowercase(),
        })
    }

    pub fn equals(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::from_condition(Condition::Equals {
            field,
            value: value.into(),
        })
    }

    /// Inclusive lower bound.
    pub fn at_least(field: &'static str, bound: impl Into<FieldValue>) -> Self {
        Self::from_condition(Condition::AtLeast {
            field,
            bound: bound.into(),
        })
    }

    /// Inclusive upper bound.
    pub fn at_most(field: &'static str, bound: impl Into<FieldValue>) -> Self {
        Self::from_condition(Condition::AtMost {
            field,
            bound: bound.into(),
        })
    }

    pub fn member_of(relation: &'static str, values: Vec<String>) -> Self {
        Self::from_condition(Condition::MemberOf { relation, values })
    }

    /// Conjunction. `always` is the identity, `never` absorbs.
    pub fn and(self, other: Predicate<T>) -> Self {
        Self::from_condition(self.condition.and(other.condition))
    }

    pub fn is_always(&self) -> bool {
        self.condition == Condition::Always
    }

    pub fn is_never(&self) -> bool {
        self.condition == Condition::Never
    }

    pub(crate) fn condition(&self) -> &Condition {
        &self.condition
    }
}

impl<T: Record> Predicate<T> {
    pub fn matches(&self, record: &T) -> bool {
        self.condition.eval(record)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self::from_condition(self.condition.clone())
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.condition == other.condition
    }
}

impl<T> core::fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Predicate")
            .field("condition", &self.condition)
            .finish()
    }
}

impl<T> Default for Predicate<T> {
    fn default() -> Self {
        Self::always()
    }
}
