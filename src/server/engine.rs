//! In-memory evaluation of a filter state against a resource's records

use crate::core::entity::Filterable;
use crate::core::error::FilterError;
use crate::core::field::FieldValue;
use crate::core::filter::{SortDirective, TypedCondition};
use crate::core::query::{FilterState, FilteredResponse};
use crate::core::schema::ResourceSchema;
use std::cmp::Ordering;

/// Applies search, filters, sort and the page window, in that order
pub struct QueryEngine;

impl QueryEngine {
    /// Validate `state` against `schema` and run it over `records`
    ///
    /// `pagination.total` counts the records left after search and filters,
    /// before the page window is cut out.
    pub fn apply<T: Filterable>(
        records: Vec<T>,
        schema: &ResourceSchema,
        state: &FilterState,
    ) -> Result<FilteredResponse<T>, FilterError> {
        let conditions = schema.validate(state)?;
        let term = state.search_term();

        let mut matched: Vec<T> = records
            .into_iter()
            .filter(|record| term.is_none_or(|t| Self::matches_search(record, &schema.search_fields, t)))
            .filter(|record| Self::matches_all(record, &conditions))
            .collect();

        let sort = schema.effective_sort(state);
        if !sort.is_empty() {
            matched.sort_by(|a, b| Self::compare(a, b, sort));
        }

        let total = matched.len();
        let data = matched
            .into_iter()
            .skip(state.offset())
            .take(state.limit)
            .collect();

        Ok(FilteredResponse::new(data, total, state))
    }

    /// Case-insensitive substring match on any search field
    pub fn matches_search<T: Filterable>(record: &T, fields: &[String], term: &str) -> bool {
        fields.iter().any(|field| {
            record
                .field_value(field)
                .is_some_and(|value| value.contains_text(term))
        })
    }

    pub fn matches_all<T: Filterable>(record: &T, conditions: &[TypedCondition]) -> bool {
        conditions.iter().all(|condition| {
            condition
                .predicate
                .matches(record.field_value(&condition.field).as_ref())
        })
    }

    /// Multi-key comparison; missing values sort last in either direction
    pub fn compare<T: Filterable>(a: &T, b: &T, sort: &[SortDirective]) -> Ordering {
        for directive in sort {
            let left = present(a.field_value(&directive.field));
            let right = present(b.field_value(&directive.field));

            let ordering = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => directive.orient(sort_key_cmp(&l, &r)),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn present(value: Option<FieldValue>) -> Option<FieldValue> {
    value.filter(|v| !v.is_null())
}

fn sort_key_cmp(left: &FieldValue, right: &FieldValue) -> Ordering {
    match (left.as_text(), right.as_text()) {
        (Some(l), Some(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        _ => left.compare(right).unwrap_or(Ordering::Equal),
    }
}
