// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::borrow::Cow;

use crate::filters::{FilterState, MAX_SUFFIX, MIN_SUFFIX};
use crate::record::{FieldValue, ViewRecord};

/// Narrows an already-fetched page to the records passing every active
/// filter. With nothing active the input is handed back borrowed.
pub fn refine<'a, R>(records: &'a [R], filters: &FilterState) -> Cow<'a, [R]>
where
    R: ViewRecord + Clone,
{
    if filters.is_empty() {
        return Cow::Borrowed(records);
    }

    Cow::Owned(
        records
            .iter()
            .filter(|record| matches(*record, filters))
            .cloned()
            .collect(),
    )
}

pub fn matches<R: ViewRecord>(record: &R, filters: &FilterState) -> bool {
    let range = filters.date_range();
    if range.is_active() && !range.contains(record.reference_date()) {
        return false;
    }

    filters
        .active()
        .all(|(key, value)| matches_key(record, key, value))
}

fn matches_key<R: ViewRecord>(record: &R, key: &str, value: &str) -> bool {
    if let Some(field) = key.strip_suffix(MIN_SUFFIX) {
        return compare_number(record, field, value, |actual, bound| actual >= bound);
    }
    if let Some(field) = key.strip_suffix(MAX_SUFFIX) {
        return compare_number(record, field, value, |actual, bound| actual <= bound);
    }

    match record.field(key) {
        FieldValue::Exact(actual) => actual.trim() == value.trim(),
        FieldValue::Text(actual) => contains_ignore_case(&actual, value),
        FieldValue::Missing => false,
    }
}

// Unparseable input on either side fails the comparison rather than erroring.
fn compare_number<R: ViewRecord>(
    record: &R,
    field: &str,
    raw_bound: &str,
    compare: impl Fn(f64, f64) -> bool,
) -> bool {
    let Ok(bound) = raw_bound.trim().parse::<f64>() else {
        return false;
    };
    if !bound.is_finite() {
        return false;
    }
    record
        .number(field)
        .is_some_and(|actual| compare(actual, bound))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}
