// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::model::SortDirection;
use crate::record::ViewRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// asc -> desc -> off for the same column; any other column starts at asc.
pub fn cycle_sort(current: Option<SortSpec>, column: &'static str) -> Option<SortSpec> {
    match current {
        Some(spec) if spec.column == column => match spec.direction {
            SortDirection::Asc => Some(SortSpec {
                column,
                direction: SortDirection::Desc,
            }),
            SortDirection::Desc => None,
        },
        _ => Some(SortSpec {
            column,
            direction: SortDirection::Asc,
        }),
    }
}

/// Nulls sort last in either direction; ties fall back to row id.
pub fn sort_rows<R: ViewRecord>(rows: &mut [R], spec: SortSpec) {
    rows.sort_by(|left, right| {
        let left_value = left.cell(spec.column);
        let right_value = right.cell(spec.column);
        let order = match (left_value.is_null(), right_value.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => match spec.direction {
                SortDirection::Asc => left_value.cmp_value(&right_value),
                SortDirection::Desc => left_value.cmp_value(&right_value).reverse(),
            },
        };
        order.then_with(|| left.row_id().cmp(&right.row_id()))
    });
}
