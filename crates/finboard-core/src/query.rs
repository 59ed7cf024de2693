//! View filter/sort/page state and the query it maps to

use crate::time::DateRange;
use chrono::NaiveDate;
use finboard_config::{Config, SortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sort column and direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// A single filter edit coming from the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Search(String),
    Categories(BTreeSet<String>),
    /// Add the category if absent, remove it if present
    ToggleCategory(String),
    DateRange(DateRange),
}

/// Everything a list view lets the user change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_text: String,
    pub categories: BTreeSet<String>,
    pub date_range: DateRange,
    pub sort: SortSpec,
    pub current_page: u32,
    pub page_size: u32,
}

impl FilterState {
    pub fn new(date_range: DateRange, sort: SortSpec, page_size: u32) -> Self {
        Self {
            search_text: String::new(),
            categories: BTreeSet::new(),
            date_range,
            sort,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Initial state for a fresh view, from configured defaults
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self::new(
            DateRange::from_preset(config.time_range.default_range, today),
            SortSpec::new(config.sort.field.clone(), config.sort.direction),
            config.pagination.records_per_page,
        )
    }

    /// Apply a filter edit; any filter change returns the view to page 1
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Search(text) => self.search_text = text,
            FilterUpdate::Categories(categories) => self.categories = categories,
            FilterUpdate::ToggleCategory(category) => {
                if !self.categories.remove(&category) {
                    self.categories.insert(category);
                }
            }
            FilterUpdate::DateRange(range) => self.date_range = range,
        }
        self.current_page = 1;
    }

    pub fn to_query(&self) -> PageQuery {
        let q = self.search_text.trim();
        PageQuery {
            page: self.current_page.max(1),
            per_page: self.page_size.max(1),
            start_date: self.date_range.start,
            end_date: self.date_range.end,
            categories: self.categories.iter().cloned().collect(),
            q: (!q.is_empty()).then(|| q.to_string()),
            sort_by: self.sort.field.clone(),
            sort_order: self.sort.direction,
        }
    }
}

/// Query parameters of a paged list request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: Vec<String>,
    pub q: Option<String>,
    pub sort_by: String,
    pub sort_order: SortDirection,
}

impl PageQuery {
    /// Wire parameters in a fixed order; empty filters are omitted
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("startDate", self.start_date.format("%Y-%m-%d").to_string()),
            ("endDate", self.end_date.format("%Y-%m-%d").to_string()),
        ];
        if !self.categories.is_empty() {
            params.push(("categories", self.categories.join(",")));
        }
        if let Some(q) = &self.q {
            params.push(("q", q.clone()));
        }
        params.push(("sort_by", self.sort_by.clone()));
        params.push(("sort_order", self.sort_order.as_str().to_string()));
        params
    }

    /// Same query, another page
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state() -> FilterState {
        FilterState::new(
            DateRange::new(date(2025, 7, 1), date(2025, 7, 31)),
            SortSpec::new("date", SortDirection::Desc),
            20,
        )
    }

    #[test]
    fn test_minimal_query_params() {
        let params = state().to_query().to_params();
        assert_eq!(
            params,
            vec![
                ("page", "1".to_string()),
                ("per_page", "20".to_string()),
                ("startDate", "2025-07-01".to_string()),
                ("endDate", "2025-07-31".to_string()),
                ("sort_by", "date".to_string()),
                ("sort_order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_full_query_params() {
        let mut s = state();
        s.apply(FilterUpdate::Search("  market  ".to_string()));
        s.apply(FilterUpdate::Categories(
            ["Gider", "Gelir"].iter().map(|c| c.to_string()).collect(),
        ));
        s.sort = SortSpec::new("amount", SortDirection::Asc);
        s.current_page = 3;

        let params = s.to_query().to_params();
        assert!(params.contains(&("categories", "Gelir,Gider".to_string())));
        assert!(params.contains(&("q", "market".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
        assert!(params.contains(&("sort_order", "asc".to_string())));
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut s = state();
        s.current_page = 4;
        s.apply(FilterUpdate::ToggleCategory("Gider".to_string()));
        assert_eq!(s.current_page, 1);
        assert!(s.categories.contains("Gider"));

        s.apply(FilterUpdate::ToggleCategory("Gider".to_string()));
        assert!(s.categories.is_empty());
    }

    #[test]
    fn test_blank_search_is_omitted() {
        let mut s = state();
        s.apply(FilterUpdate::Search("   ".to_string()));
        assert_eq!(s.to_query().q, None);
    }

    #[test]
    fn test_query_is_pure_function_of_state() {
        let s = state();
        assert_eq!(s.to_query(), s.to_query());
        assert_eq!(s.to_query().with_page(0).page, 1);
    }

    #[test]
    fn test_from_config_defaults() {
        let s = FilterState::from_config(&Config::default(), date(2025, 2, 10));
        assert_eq!(s.page_size, 20);
        assert_eq!(s.date_range.end, date(2025, 2, 28));
        assert_eq!(s.sort.field, "date");
    }
}
