// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
/// Maior página cujo OFFSET ainda cabe em BIGINT.
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Parâmetros `?page=&limit=` comuns a todas as listagens.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page: Some(page), limit: Some(limit) }
    }

    /// Página normalizada (mínimo 1, teto `MAX_PAGE`).
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE).min(MAX_PAGE)
    }

    /// Limite normalizado: padrão 20, teto 100.
    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(params: &PageParams, total: i64) -> Self {
        let limit = params.limit();
        Self {
            page: params.page(),
            limit,
            total,
            // ceil(total / limit)
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: &PageParams, total: i64) -> Self {
        Self { data, pagination: Pagination::new(params, total) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 20);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn limit_is_capped_at_one_hundred() {
        let params = PageParams::new(1, 200);
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(PageParams::new(2, 20).offset(), 20);
        assert_eq!(PageParams::new(0, 20).offset(), 0);
    }

    #[test]
    fn huge_page_number_does_not_overflow_the_offset() {
        let params = PageParams::new(i64::MAX, 100);
        assert_eq!(params.page(), MAX_PAGE);
        assert!(params.offset() > 0);
        assert_eq!(params.offset(), (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(&PageParams::new(1, 20), 100).total_pages, 5);
        assert_eq!(Pagination::new(&PageParams::new(1, 20), 25).total_pages, 2);
        assert_eq!(Pagination::new(&PageParams::new(1, 20), 0).total_pages, 0);
    }
}
