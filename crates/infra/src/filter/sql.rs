//! Postgres rendering of predicates.
//!
//! Values are always bound, never interpolated. The main table is aliased `t`
//! and relation subqueries use `r`.

use sqlx::{Postgres, QueryBuilder};

use super::predicate::{Condition, FieldValue, Predicate};
use super::record::Record;

const ALIAS: &str = "t";

impl<T: Record> Predicate<T> {
    /// Append this predicate as a boolean SQL expression.
    pub fn push_sql<'args>(&self, qb: &mut QueryBuilder<'args, Postgres>) {
        push_condition::<T>(self.condition(), qb);
    }

    /// `SELECT * FROM <table> t WHERE <predicate>`.
    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {} {ALIAS} WHERE ", T::TABLE));
        self.push_sql(&mut qb);
        qb
    }
}

fn push_condition<T: Record>(condition: &Condition, qb: &mut QueryBuilder<'_, Postgres>) {
    match condition {
        Condition::Always => {
            qb.push("TRUE");
        }
        Condition::Never => {
            qb.push("FALSE");
        }
        Condition::Contains { field, needle } => {
            qb.push(format!("{ALIAS}.{field} ILIKE "));
            qb.push_bind(format!("%{}%", escape_like(needle)));
            qb.push(" ESCAPE '\\'");
        }
        Condition::Equals { field, value } => {
            if *value == FieldValue::Null {
                qb.push(format!("{ALIAS}.{field} IS NULL"));
            } else {
                qb.push(format!("{ALIAS}.{field} = "));
                push_value(value, qb);
            }
        }
        Condition::AtLeast { field, bound } => {
            qb.push(format!("{ALIAS}.{field} >= "));
            push_value(bound, qb);
        }
        Condition::AtMost { field, bound } => {
            qb.push(format!("{ALIAS}.{field} <= "));
            push_value(bound, qb);
        }
        Condition::MemberOf { relation, values } => match T::relation(relation) {
            Some(rel) => {
                qb.push(format!(
                    "EXISTS (SELECT 1 FROM {} r WHERE r.{} = {ALIAS}.id AND r.{} = ANY(",
                    rel.table, rel.foreign_key, rel.column
                ));
                qb.push_bind(values.clone());
                qb.push("))");
            }
            None => {
                tracing::warn!(relation, table = T::TABLE, "unknown relation in predicate");
                qb.push("FALSE");
            }
        },
        Condition::All(parts) => {
            qb.push("(");
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    qb.push(" AND ");
                }
                push_condition::<T>(part, qb);
            }
            qb.push(")");
        }
    }
}

fn push_value(value: &FieldValue, qb: &mut QueryBuilder<'_, Postgres>) {
    match value {
        FieldValue::Null => {
            qb.push("NULL");
        }
        FieldValue::Text(text) => {
            qb.push_bind(text.clone());
        }
        FieldValue::Uuid(id) => {
            qb.push_bind(*id);
        }
        FieldValue::Timestamp(at) => {
            qb.push_bind(*at);
        }
        FieldValue::Date(date) => {
            qb.push_bind(*date);
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use backoffice_core::{ClaimFilter, CompanyFilter, CompanyId, DateRange, UserFilter, UserFunction};
    use chrono::NaiveDate;

    use super::*;
    use crate::filter::build;

    #[test]
    fn empty_filter_renders_true() {
        let qb = build(&CompanyFilter::default()).select_query();
        assert_eq!(qb.sql(), "SELECT * FROM companies t WHERE TRUE");
    }

    #[test]
    fn unknown_status_renders_false() {
        let filter = ClaimFilter {
            status: Some("LOST".into()),
            ..Default::default()
        };
        assert_eq!(
            build(&filter).select_query().sql(),
            "SELECT * FROM claims t WHERE FALSE"
        );
    }

    #[test]
    fn conditions_are_joined_with_bound_parameters() {
        let filter = ClaimFilter {
            company_id: Some(CompanyId::new()),
            status: Some("paid".into()),
            service_date: DateRange::between(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            ),
            ..Default::default()
        };
        assert_eq!(
            build(&filter).select_query().sql(),
            "SELECT * FROM claims t WHERE (t.company_id = $1 AND t.status = $2 \
             AND t.service_date >= $3 AND t.service_date <= $4)"
        );
    }

    #[test]
    fn text_search_uses_escaped_ilike() {
        let filter = CompanyFilter {
            name: Some("100%".into()),
            ..Default::default()
        };
        assert_eq!(
            build(&filter).select_query().sql(),
            "SELECT * FROM companies t WHERE t.name ILIKE $1 ESCAPE '\\'"
        );
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[test]
    fn function_membership_renders_exists_subquery() {
        let filter = UserFilter {
            functions: vec![UserFunction::ClaimManager],
            ..Default::default()
        };
        assert_eq!(
            build(&filter).select_query().sql(),
            "SELECT * FROM users t WHERE EXISTS (SELECT 1 FROM user_functions r \
             WHERE r.user_id = t.id AND r.function = ANY($1))"
        );
    }

    #[test]
    fn null_equality_renders_is_null() {
        let p = Predicate::<backoffice_core::User>::equals("company_id", FieldValue::Null);
        assert_eq!(p.select_query().sql(), "SELECT * FROM users t WHERE t.company_id IS NULL");
    }
}
