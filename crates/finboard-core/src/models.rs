//! Wire-level data models shared with the backend

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One dated financial record as the backend returns it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    /// Booking date (`YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Signed amount; accepted as a JSON number or string
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub budget_item_name: String,
    #[serde(default)]
    pub description: String,
    /// ISO 4217 code
    #[serde(default)]
    pub currency: String,
}

/// Pagination block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_items: u64,
}

impl Pagination {
    /// Number of pages at the given page size
    pub fn total_pages(&self, per_page: u32) -> u64 {
        if per_page == 0 {
            return 0;
        }
        self.total_items.div_ceil(u64::from(per_page))
    }
}

/// Body of a paged list endpoint: `{ data: [...], pagination: {...} }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub data: Vec<TransactionRecord>,
    pub pagination: Pagination,
}

/// Result committed to a view after a successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchResult {
    pub rows: Vec<TransactionRecord>,
    pub pagination: Pagination,
}

impl From<PageResponse> for FetchResult {
    fn from(response: PageResponse) -> Self {
        Self {
            rows: response.data,
            pagination: response.pagination,
        }
    }
}
