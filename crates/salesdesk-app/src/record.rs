// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::borrow::Cow;
use std::cmp::Ordering;
use time::Date;

use crate::model::{SalesOrder, iso_date};
use crate::{ColumnDescriptor, ColumnRegistry};

/// How a keyed filter is matched against one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Enumerated values (status, counts): exact match.
    Exact(Cow<'a, str>),
    /// Free text: case-insensitive substring containment.
    Text(Cow<'a, str>),
    Missing,
}

/// A row a list view can filter, sort, and render.
pub trait ViewRecord {
    fn row_id(&self) -> i64;

    /// The date a date-range filter is checked against.
    fn reference_date(&self) -> Option<Date>;

    /// Numeric value behind `<field>_min` / `<field>_max` filters.
    fn number(&self, field: &str) -> Option<f64>;

    fn field(&self, key: &str) -> FieldValue<'_>;

    fn cell(&self, column: &str) -> Cell;
}

impl<R: ViewRecord + ?Sized> ViewRecord for &R {
    fn row_id(&self) -> i64 {
        (**self).row_id()
    }

    fn reference_date(&self) -> Option<Date> {
        (**self).reference_date()
    }

    fn number(&self, field: &str) -> Option<f64> {
        (**self).number(field)
    }

    fn field(&self, key: &str) -> FieldValue<'_> {
        (**self).field(key)
    }

    fn cell(&self, column: &str) -> Cell {
        (**self).cell(column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Money(Option<f64>),
    Date(Option<Date>),
    Status(String),
    Empty,
}

impl Cell {
    pub fn display(&self) -> String {
        match self {
            Self::Text(value) | Self::Status(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Money(Some(value)) => format!("{value:.2}"),
            Self::Date(Some(date)) => iso_date::format(*date),
            Self::Money(None) | Self::Date(None) | Self::Empty => String::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Text(value) | Self::Status(value) => value.is_empty(),
            Self::Money(value) => value.is_none(),
            Self::Date(value) => value.is_none(),
            Self::Integer(_) => false,
            Self::Empty => true,
        }
    }

    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(left), Self::Integer(right)) => left.cmp(right),
            (Self::Money(Some(left)), Self::Money(Some(right))) => left.total_cmp(right),
            (Self::Date(Some(left)), Self::Date(Some(right))) => left.cmp(right),
            _ => self
                .display()
                .to_lowercase()
                .cmp(&other.display().to_lowercase()),
        }
    }
}

pub const INDEX_COLUMN: &str = "index";

pub fn sales_order_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new(INDEX_COLUMN, "#", 4, false),
        ColumnDescriptor::new("order_number", "order", 10, true),
        ColumnDescriptor::new("customer_name", "customer", 20, true),
        ColumnDescriptor::new("location", "location", 22, false),
        ColumnDescriptor::new("status", "status", 11, true),
        ColumnDescriptor::new("oil_type", "oil type", 14, true),
        ColumnDescriptor::new("quantity", "qty", 5, true),
        ColumnDescriptor::new("total_amount", "total", 11, true),
        ColumnDescriptor::new("order_date", "date", 10, true),
        ColumnDescriptor::new("convinced_by", "convinced by", 16, true).hidden(),
    ]
}

pub fn sales_order_registry() -> anyhow::Result<ColumnRegistry> {
    ColumnRegistry::new(sales_order_columns(), INDEX_COLUMN)
}

impl SalesOrder {
    fn location(&self) -> String {
        format!("{} {}", self.address.trim(), self.city.trim())
            .trim()
            .to_owned()
    }

    fn convinced_by(&self) -> String {
        self.sales_person
            .as_ref()
            .map(|person| person.full_name())
            .unwrap_or_default()
    }
}

impl ViewRecord for SalesOrder {
    fn row_id(&self) -> i64 {
        self.id.get()
    }

    fn reference_date(&self) -> Option<Date> {
        self.order_date
    }

    fn number(&self, field: &str) -> Option<f64> {
        match field {
            "total_amount" => self.total_amount.as_f64(),
            "quantity" => self.first_item().map(|item| item.quantity as f64),
            _ => None,
        }
    }

    fn field(&self, key: &str) -> FieldValue<'_> {
        match key {
            "status" => FieldValue::Exact(Cow::Borrowed(self.status.as_str())),
            // Line-item fields only look at the first item.
            "quantity" => match self.first_item() {
                Some(item) => FieldValue::Exact(Cow::Owned(item.quantity.to_string())),
                None => FieldValue::Missing,
            },
            "oil_type" => match self.first_item() {
                Some(item) => FieldValue::Text(Cow::Borrowed(item.product_name.as_str())),
                None => FieldValue::Missing,
            },
            "order_number" => FieldValue::Text(Cow::Borrowed(self.order_number.as_str())),
            "customer_name" => FieldValue::Text(Cow::Borrowed(self.customer_name.as_str())),
            "city" => FieldValue::Text(Cow::Borrowed(self.city.as_str())),
            "location" => FieldValue::Text(Cow::Owned(self.location())),
            "convinced_by" => FieldValue::Text(Cow::Owned(self.convinced_by())),
            _ => FieldValue::Missing,
        }
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            INDEX_COLUMN => Cell::Integer(self.id.get()),
            "order_number" => Cell::Text(self.order_number.clone()),
            "customer_name" => Cell::Text(self.customer_name.clone()),
            "location" => Cell::Text(self.location()),
            "status" => Cell::Status(self.status.as_str().to_owned()),
            "oil_type" => Cell::Text(
                self.first_item()
                    .map(|item| item.product_name.clone())
                    .unwrap_or_default(),
            ),
            "quantity" => match self.first_item() {
                Some(item) => Cell::Integer(item.quantity),
                None => Cell::Empty,
            },
            "total_amount" => Cell::Money(self.total_amount.as_f64()),
            "order_date" => Cell::Date(self.order_date),
            "convinced_by" => Cell::Text(self.convinced_by()),
            _ => Cell::Empty,
        }
    }
}
