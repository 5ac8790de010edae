// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub visible: bool,
    pub width: u16,
    pub sortable: bool,
}

impl ColumnDescriptor {
    pub const fn new(id: &'static str, label: &'static str, width: u16, sortable: bool) -> Self {
        Self {
            id,
            label,
            visible: true,
            width,
            sortable,
        }
    }

    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Ordered column set for one list view. The sentinel column (the row index)
/// survives `hide_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDescriptor>,
    sentinel: &'static str,
}

impl ColumnRegistry {
    pub fn new(columns: Vec<ColumnDescriptor>, sentinel: &'static str) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.id) {
                bail!("duplicate column id {:?}", column.id);
            }
        }
        if !seen.contains(sentinel) {
            bail!("sentinel column {sentinel:?} is not one of the view's columns");
        }

        let mut registry = Self { columns, sentinel };
        registry.set_visible(sentinel, true);
        Ok(registry)
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn sentinel(&self) -> &'static str {
        self.sentinel
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn visible(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|column| column.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// Flips visibility of `id`. Returns false when no column matched; an
    /// unknown id is otherwise ignored.
    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        match self.columns.iter_mut().find(|column| column.id == id) {
            Some(column) => {
                column.visible = !column.visible;
                true
            }
            None => {
                tracing::debug!(column = id, "ignoring visibility toggle for unknown column");
                false
            }
        }
    }

    pub fn show_all(&mut self) {
        for column in &mut self.columns {
            column.visible = true;
        }
    }

    pub fn hide_all(&mut self) {
        let sentinel = self.sentinel;
        for column in &mut self.columns {
            column.visible = column.id == sentinel;
        }
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(column) = self.columns.iter_mut().find(|column| column.id == id) {
            column.visible = visible;
        }
    }
}
