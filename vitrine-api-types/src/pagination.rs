use serde::{Deserialize, Serialize};

/// Pagination input accepted by list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationInput {
    pub page: u64,
    pub limit: u64,
}

impl Default for PaginationInput {
    fn default() -> Self {
        Self { page: 1, limit: 25 }
    }
}

impl PaginationInput {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

/// Pagination metadata returned with list responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(input: PaginationInput, total: u64) -> Self {
        let total_pages = if input.limit == 0 { 0 } else { total.div_ceil(input.limit) };
        Self {
            page: input.page,
            limit: input.limit,
            total,
            total_pages,
        }
    }
}

/// List response wrapper pairing items with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, input: PaginationInput, total: u64) -> Self {
        Self {
            items,
            meta: PaginationMeta::new(input, total),
        }
    }
}
