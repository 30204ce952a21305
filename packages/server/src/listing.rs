//! Search, sort, foreign-key filtering and pagination for list endpoints.
//!
//! A [`ListQuery`] is built once per request. [`ListQuery::fetch`] runs the
//! count and the page fetch from the same predicate, so `total` always
//! describes the rows a client can page through.

use sea_orm::sea_query::LikeExpr;
use sea_orm::*;
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;
/// Highest page number honoured; keeps the row offset inside a signed 64-bit
/// SQL OFFSET for every page size.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PER_PAGE;

/// Raw datatable parameters. Kept as strings so malformed numbers fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DatatableParams {
    /// Page size; defaults to 10 when missing, malformed or not positive.
    pub limit: Option<String>,
    /// 1-based page number; defaults to 1 when missing, malformed or not positive.
    pub page: Option<String>,
    /// Sort direction, `asc` or `desc`.
    pub sort: Option<String>,
    /// Public name of the sort column.
    pub sort_by: Option<String>,
    /// Substring matched against the endpoint's searchable columns.
    pub search: Option<String>,
}

/// Per-entity description of what a list endpoint may search and sort on.
pub struct Listing<E: EntityTrait> {
    /// Text columns OR-ed together for `search`.
    pub search: &'static [E::Column],
    /// Allow-list from public `sort_by` names to columns.
    pub sort: &'static [(&'static str, E::Column)],
    /// Appended to every ordering so pages never overlap.
    pub tie_breaker: E::Column,
}

impl<E: EntityTrait> Listing<E> {
    fn sort_column(&self, name: &str) -> Result<E::Column, AppError> {
        self.sort
            .iter()
            .find(|(public, _)| *public == name)
            .map(|(_, column)| *column)
            .ok_or_else(|| {
                let allowed: Vec<&str> = self.sort.iter().map(|(public, _)| *public).collect();
                AppError::Validation(format!("sort_by must be one of: {}", allowed.join(", ")))
            })
    }
}

/// One page of results plus the totals computed under the same predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Same page metadata around different items, e.g. rows rendered into views.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    search: Option<String>,
    sort_by: Option<String>,
    order: Order,
    page: u64,
    per_page: u64,
    filter: Condition,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            order: Order::Asc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            filter: Condition::all(),
        }
    }
}

impl ListQuery {
    pub fn from_params(params: &DatatableParams) -> Self {
        let order = match params.sort.as_deref().map(str::trim) {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Order::Desc,
            _ => Order::Asc,
        };

        Self {
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_by: params
                .sort_by
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            order,
            page: Ord::min(parse_positive(params.page.as_deref()).unwrap_or(1), MAX_PAGE),
            per_page: Ord::min(
                parse_positive(params.limit.as_deref()).unwrap_or(DEFAULT_PER_PAGE),
                MAX_PER_PAGE,
            ),
            filter: Condition::all(),
        }
    }

    /// AND an equality filter on `column` when `value` is present.
    pub fn filter_eq<C: ColumnTrait>(mut self, column: C, value: Option<i32>) -> Self {
        if let Some(value) = value {
            self.filter = self.filter.add(column.eq(value));
        }
        self
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Rows skipped before the current page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Search OR-ed across the listing's columns, AND-ed with the filters.
    fn predicate<E: EntityTrait>(&self, listing: &Listing<E>) -> Condition {
        let mut condition = self.filter.clone();
        if let Some(search) = &self.search
            && !listing.search.is_empty()
        {
            let pattern = format!("%{}%", escape_like(search));
            let any = listing.search.iter().fold(Condition::any(), |any, column| {
                any.add(column.like(LikeExpr::new(pattern.clone()).escape('\\')))
            });
            condition = condition.add(any);
        }
        condition
    }

    fn ordered<E: EntityTrait>(
        &self,
        select: Select<E>,
        listing: &Listing<E>,
    ) -> Result<Select<E>, AppError> {
        let select = match &self.sort_by {
            Some(name) => select.order_by(listing.sort_column(name)?, self.order.clone()),
            None => select,
        };
        Ok(select.order_by_asc(listing.tie_breaker))
    }

    /// Count and fetch one page of `select` under this query.
    pub async fn fetch<E, C>(
        &self,
        db: &C,
        select: Select<E>,
        listing: &Listing<E>,
    ) -> Result<Page<E::Model>, AppError>
    where
        E: EntityTrait,
        E::Model: Sync,
        C: ConnectionTrait,
    {
        let select = select.filter(self.predicate(listing));
        // Reject a bad sort column before touching the database.
        let ordered = self.ordered(select.clone(), listing)?;

        let total = select.count(db).await?;
        let items = ordered
            .offset(Some(self.offset()))
            .limit(Some(self.per_page))
            .all(db)
            .await?;

        Ok(Page {
            items,
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: total.div_ceil(self.per_page),
        })
    }

    /// Every row matching the predicate, ordered but not paginated.
    pub async fn fetch_all<E, C>(
        &self,
        db: &C,
        select: Select<E>,
        listing: &Listing<E>,
    ) -> Result<Vec<E::Model>, AppError>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        let select = self.ordered(select.filter(self.predicate(listing)), listing)?;
        Ok(select.all(db).await?)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

/// Parse an optional foreign-key filter. Blank means "no filter"; anything
/// else must be a positive integer.
pub fn parse_filter_id(field: &str, raw: Option<&str>) -> Result<Option<i32>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("{field} must be a positive integer"))),
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
