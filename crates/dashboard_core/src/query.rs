//! Query state of a list view and the pure transitions applied to it.

use shared::protocol::{ListParams, SortDirection};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const PAGE_SIZE_OPTIONS: [u32; 6] = [5, 10, 20, 30, 40, 50];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    pub search_text: String,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAction {
    SetSearchText(String),
    ToggleSort(String),
    SetPageIndex(u32),
    SetPageSize(u32),
}

impl QueryState {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            sort_field: None,
            sort_direction: SortDirection::Asc,
            search_text: String::new(),
        }
    }

    /// Next state after `action`. A zero page size leaves the state untouched.
    pub fn reduce(&self, action: QueryAction) -> QueryState {
        let mut next = self.clone();
        match action {
            QueryAction::SetSearchText(text) => {
                if text != next.search_text {
                    next.search_text = text;
                    next.page_index = 0;
                }
            }
            QueryAction::ToggleSort(field) => {
                if next.sort_field.as_deref() == Some(field.as_str()) {
                    next.sort_direction = next.sort_direction.toggled();
                } else {
                    next.sort_field = Some(field);
                    next.sort_direction = SortDirection::Asc;
                }
            }
            QueryAction::SetPageIndex(index) => next.page_index = index,
            QueryAction::SetPageSize(0) => {}
            QueryAction::SetPageSize(size) => {
                if size != next.page_size {
                    next.page_size = size;
                    next.page_index = 0;
                }
            }
        }
        next
    }

    pub fn to_params(&self) -> ListParams {
        let search = Some(self.search_text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_owned);
        ListParams {
            page: self.page_index + 1,
            limit: self.page_size,
            search,
            sort_by: self.sort_field.clone(),
            order: self.sort_field.as_ref().map(|_| self.sort_direction),
        }
    }

    pub fn page_count(&self, total_count: u64) -> u64 {
        total_count.div_ceil(u64::from(self.page_size.max(1)))
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self, total_count: u64) -> bool {
        u64::from(self.page_index) + 1 < self.page_count(total_count)
    }

    pub fn last_page_index(&self, total_count: u64) -> u32 {
        let last = self.page_count(total_count).saturating_sub(1);
        u32::try_from(last).unwrap_or(u32::MAX)
    }

    /// "No" column value for the row at `row_index` on the current page.
    pub fn row_number(&self, row_index: usize) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size) + row_index as u64 + 1
    }

    /// `"start-end of total"`, or `"0 of 0"` for an empty result.
    pub fn range_label(&self, total_count: u64) -> String {
        if total_count == 0 {
            return "0 of 0".to_string();
        }
        let size = u64::from(self.page_size);
        let start = u64::from(self.page_index) * size + 1;
        let end = ((u64::from(self.page_index) + 1) * size).min(total_count);
        format!("{start}-{end} of {total_count}")
    }
}
