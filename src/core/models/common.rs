use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::filter::Predicate;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page whose offset still fits an `i64` at the largest page size.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    size: i64,
}

impl Pagination {
    /// Pages start at 1 and are capped at `MAX_PAGE`. A non-positive size falls back to the
    /// default, large sizes are capped.
    pub fn new(page: i64, size: i64) -> Self {
        let size = if size < 1 { DEFAULT_PAGE_SIZE } else { size.min(MAX_PAGE_SIZE) };
        Self { page: page.clamp(1, MAX_PAGE), size }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count <= 0 || page_size <= 0 {
        return 1;
    }
    ((total_count + page_size - 1) / page_size).max(1)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(mut data: Vec<T>, total_count: i64, pagination: Pagination) -> Self {
        data.truncate(pagination.limit() as usize);
        Self {
            data,
            total_count,
            total_pages: total_pages(total_count, pagination.limit()),
            current_page: pagination.page(),
            page_size: pagination.limit(),
        }
    }

    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), 0, pagination)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self { column, direction: SortDirection::Asc }
    }

    pub fn desc(column: &'static str) -> Self {
        Self { column, direction: SortDirection::Desc }
    }
}

/// Ordering for a list query: a backend `ORDER BY` when the key maps to a column,
/// otherwise the default backend order and a re-sort of the fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering<K> {
    pub backend: Vec<Order>,
    pub in_page: Option<(K, SortDirection)>,
}

impl<K: Copy> Ordering<K> {
    /// `column` maps a sort key to its backend column, `None` meaning the key is derived.
    pub fn new<C>(sort_by: Option<K>, direction: SortDirection, column: C, default: Vec<Order>, tie_break: &'static str) -> Self
    where
        C: Fn(K) -> Option<&'static str>,
    {
        match sort_by.map(|key| (key, column(key))) {
            None => Self { backend: default, in_page: None },
            Some((_, Some(column))) => Self {
                backend: vec![Order { column, direction }, Order::desc(tie_break)],
                in_page: None,
            },
            Some((key, None)) => Self {
                backend: default,
                in_page: Some((key, direction)),
            },
        }
    }
}

/// What the repositories receive for a list or count: the organization, the folded
/// predicates and the order.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub organization_id: Uuid,
    pub predicates: Vec<Predicate>,
    pub order: Vec<Order>,
}

impl ListQuery {
    pub fn new(organization_id: Uuid, predicates: Vec<Predicate>, order: Vec<Order>) -> Self {
        Self {
            organization_id,
            predicates,
            order,
        }
    }
}

/// Where an update or soft delete is allowed to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateScope {
    pub organization_id: Uuid,
    pub created_by: Option<Uuid>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// The paging and sorting half of every list request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams<F, K> {
    #[serde(default)]
    pub filter: F,
    pub sort_by: Option<K>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl<F: Default, K> Default for ListParams<F, K> {
    fn default() -> Self {
        Self {
            filter: F::default(),
            sort_by: None,
            sort_direction: SortDirection::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<F, K> ListParams<F, K> {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}
