use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

// 查询参数保持为字符串，非法值回落到默认值而不是 400
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn from_query(query: &PageQuery) -> Self {
        let page = query
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let per_page = query
            .per_page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| (1..=MAX_PER_PAGE).contains(p))
            .unwrap_or(DEFAULT_PER_PAGE);

        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: total_pages(total, pagination.per_page),
        }
    }
}

fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}
