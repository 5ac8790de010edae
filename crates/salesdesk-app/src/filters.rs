// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use time::Date;

pub const MIN_SUFFIX: &str = "_min";
pub const MAX_SUFFIX: &str = "_max";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateRange {
    /// Builds a range, swapping a reversed pair so `from <= to` holds.
    pub fn new(from: Option<Date>, to: Option<Date>) -> Self {
        match (from, to) {
            (Some(from), Some(to)) if from > to => Self {
                from: Some(to),
                to: Some(from),
            },
            _ => Self { from, to },
        }
    }

    pub const fn is_active(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Inclusive on both ends. An inactive range contains everything.
    pub fn contains(&self, date: Option<Date>) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => date.is_some_and(|date| from <= date && date <= to),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    values: BTreeMap<String, String>,
    range: DateRange,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites `key`; an empty value removes the constraint.
    pub fn set_filter(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_owned(), value.to_owned());
        }
    }

    pub fn set_date_range(&mut self, from: Option<Date>, to: Option<Date>) {
        self.range = DateRange::new(from, to);
    }

    /// Replaces every keyed filter at once; the date range is untouched.
    pub fn apply<I, K, V>(&mut self, filters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.values.clear();
        for (key, value) in filters {
            self.set_filter(key.as_ref(), value.as_ref());
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.range = DateRange::default();
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn date_range(&self) -> DateRange {
        self.range
    }

    /// Keyed filters that constrain anything, in key order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none() && !self.range.is_active()
    }

    pub fn active_count(&self) -> usize {
        self.active().count() + usize::from(self.range.is_active())
    }
}
