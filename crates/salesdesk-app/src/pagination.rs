// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

pub const PAGE_SIZE_CHOICES: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    current_page: usize,
    page_size: usize,
    total_count: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: 0,
        }
    }
}

impl PaginationState {
    pub fn new(page_size: usize) -> Result<Self> {
        validate_page_size(page_size)?;
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    pub const fn total_pages(&self) -> usize {
        total_pages(self.total_count, self.page_size)
    }

    /// Moves to `page`, clamped into `[1, total_pages]`, and returns the page
    /// actually selected.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.current_page = page.clamp(1, self.total_pages());
        self.current_page
    }

    pub fn change_page_size(&mut self, size: usize) -> Result<()> {
        validate_page_size(size)?;
        self.page_size = size;
        self.current_page = 1;
        Ok(())
    }

    pub fn reset_to_first(&mut self) {
        self.current_page = 1;
    }

    pub fn set_total_count(&mut self, count: usize) {
        self.total_count = count;
    }

    /// Row number of the first row on the current page, counting from 1.
    pub const fn first_ordinal(&self) -> usize {
        (self.current_page - 1) * self.page_size + 1
    }

    /// The next size in `PAGE_SIZE_CHOICES` after the current one, wrapping.
    pub fn next_size_choice(&self, delta: isize) -> usize {
        let current = PAGE_SIZE_CHOICES
            .iter()
            .position(|size| *size == self.page_size)
            .unwrap_or(0) as isize;
        let len = PAGE_SIZE_CHOICES.len() as isize;
        PAGE_SIZE_CHOICES[(current + delta).rem_euclid(len) as usize]
    }
}

pub const fn total_pages(total_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    let pages = total_count.div_ceil(page_size);
    if pages == 0 { 1 } else { pages }
}

fn validate_page_size(size: usize) -> Result<()> {
    if size == 0 {
        bail!("page size must be positive, got 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PaginationState, total_pages};
    use anyhow::Result;

    #[test]
    fn total_pages_is_ceiling_with_floor_of_one() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(250, 25), 10);
        for size in 1..=30 {
            for count in 0..=200 {
                assert_eq!(total_pages(count, size), count.div_ceil(size).max(1));
            }
        }
    }

    #[test]
    fn go_to_page_clamps_into_range() -> Result<()> {
        let mut pagination = PaginationState::new(10)?;
        pagination.set_total_count(35);
        assert_eq!(pagination.go_to_page(0), 1);
        assert_eq!(pagination.go_to_page(3), 3);
        assert_eq!(pagination.go_to_page(99), 4);
        Ok(())
    }

    #[test]
    fn page_size_change_resets_to_first_page() -> Result<()> {
        let mut pagination = PaginationState::new(10)?;
        pagination.set_total_count(100);
        pagination.go_to_page(3);
        pagination.change_page_size(25)?;
        assert_eq!(pagination.current_page(), 1);
        assert_eq!(pagination.page_size(), 25);
        assert_eq!(pagination.total_pages(), 4);
        Ok(())
    }

    #[test]
    fn zero_page_size_is_rejected_and_state_kept() -> Result<()> {
        let mut pagination = PaginationState::new(10)?;
        pagination.set_total_count(100);
        pagination.go_to_page(2);
        let error = pagination
            .change_page_size(0)
            .expect_err("zero page size should fail");
        assert!(error.to_string().contains("must be positive"));
        assert_eq!(pagination.current_page(), 2);
        assert_eq!(pagination.page_size(), 10);
        assert!(PaginationState::new(0).is_err());
        Ok(())
    }

    #[test]
    fn size_choices_wrap() -> Result<()> {
        let pagination = PaginationState::new(100)?;
        assert_eq!(pagination.next_size_choice(1), 10);
        assert_eq!(pagination.next_size_choice(-1), 50);
        Ok(())
    }
}
