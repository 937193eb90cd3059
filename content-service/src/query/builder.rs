//! Staged assembly of a [`ListQuery`].
//!
//! Stages consume and return the builder so a handler reads top to bottom:
//!
//! ```
//! use content_service::query::{ListParams, PageDefaults, QueryBuilder};
//!
//! let params = ListParams::from_query_str("category=inverter&sort=-price&page=2").unwrap();
//! let query = QueryBuilder::new(params)
//!     .filter()
//!     .search(&["name", "description"])
//!     .sort()
//!     .limit_fields()
//!     .paginate(&PageDefaults::default())
//!     .build();
//!
//! assert_eq!(query.pagination().skip(), 100);
//! ```
//!
//! A stage that is never applied leaves its part of the query empty, which
//! keeps the query usable for partial builds such as counting.

use super::params::{Condition, ListParams, PageDefaults, SortSpec};
use bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use serde::Serialize;
use std::collections::BTreeMap;

/// Case-insensitive substring search across a fixed set of text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    term: String,
    fields: Vec<String>,
}

impl SearchSpec {
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// `$or` of escaped, case-insensitive regexes, one per field.
    pub fn to_document(&self) -> Document {
        let pattern = regex::escape(&self.term);
        let clauses: Vec<Bson> = self
            .fields
            .iter()
            .map(|field| {
                Bson::Document(doc! { field.as_str(): { "$regex": pattern.as_str(), "$options": "i" } })
            })
            .collect();
        doc! { "$or": clauses }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only these fields plus `_id`.
    Include(Vec<String>),
    /// Everything except the internal version key.
    ExcludeInternal,
}

pub const VERSION_KEY: &str = "__v";

impl Projection {
    pub fn to_document(&self) -> Document {
        match self {
            Projection::Include(fields) => {
                let mut projection = doc! { "_id": 1 };
                for field in fields {
                    projection.insert(field.as_str(), 1);
                }
                projection
            }
            Projection::ExcludeInternal => doc! { VERSION_KEY: 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }

    pub fn meta(&self, total: u64) -> PaginationMeta {
        PaginationMeta {
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages(total),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, super::params::DEFAULT_PAGE_LIMIT)
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// A fully assembled, immutable list query. Both the page fetch and the
/// total count are derived from the same value, so they always agree on the
/// filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    filters: BTreeMap<String, Vec<Condition>>,
    search: Option<SearchSpec>,
    sort: SortSpec,
    projection: Projection,
    pagination: Pagination,
}

impl ListQuery {
    fn unrefined() -> Self {
        Self {
            filters: BTreeMap::new(),
            search: None,
            sort: SortSpec::default(),
            projection: Projection::ExcludeInternal,
            pagination: Pagination::default(),
        }
    }

    /// Runs every stage with the given searchable fields and defaults.
    pub fn from_params(params: ListParams, searchable: &[&str], defaults: &PageDefaults) -> Self {
        QueryBuilder::new(params)
            .filter()
            .search(searchable)
            .sort()
            .limit_fields()
            .paginate(defaults)
            .build()
    }

    pub fn filters(&self) -> &BTreeMap<String, Vec<Condition>> {
        &self.filters
    }

    pub fn search(&self) -> Option<&SearchSpec> {
        self.search.as_ref()
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Field filters and search combined. Search is AND-ed with the filters
    /// when both are present.
    pub fn filter_document(&self) -> Document {
        let mut filter = Document::new();
        for (field, conditions) in &self.filters {
            let mut operators = Document::new();
            for condition in conditions {
                operators.insert(condition.operator(), condition.to_bson());
            }
            filter.insert(field.as_str(), operators);
        }

        match &self.search {
            None => filter,
            Some(search) if filter.is_empty() => search.to_document(),
            Some(search) => doc! { "$and": [filter, search.to_document()] },
        }
    }

    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }
        let mut sort = Document::new();
        for key in self.sort.keys() {
            sort.insert(key.field.as_str(), key.direction.as_i32());
        }
        Some(sort)
    }

    pub fn projection_document(&self) -> Document {
        self.projection.to_document()
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .sort(self.sort_document())
            .projection(self.projection_document())
            .skip(self.pagination.skip())
            .limit(i64::try_from(self.pagination.limit()).unwrap_or(i64::MAX))
            .build()
    }
}

/// Builds a [`ListQuery`] from parsed [`ListParams`], one stage at a time.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    params: ListParams,
    query: ListQuery,
}

impl QueryBuilder {
    pub fn new(params: ListParams) -> Self {
        Self {
            params,
            query: ListQuery::unrefined(),
        }
    }

    /// Field conditions from every non-reserved key.
    #[must_use]
    pub fn filter(mut self) -> Self {
        self.query.filters = self.params.filters.clone();
        self
    }

    /// Free-text search over `fields`. A no-op when there is no term or the
    /// content type has nothing searchable.
    #[must_use]
    pub fn search(mut self, fields: &[&str]) -> Self {
        self.query.search = match &self.params.search {
            Some(term) if !fields.is_empty() => Some(SearchSpec {
                term: term.clone(),
                fields: fields.iter().map(|field| field.to_string()).collect(),
            }),
            _ => None,
        };
        self
    }

    /// Requested order, or newest first.
    #[must_use]
    pub fn sort(mut self) -> Self {
        self.query.sort = self
            .params
            .sort
            .clone()
            .unwrap_or_else(SortSpec::newest_first)
            .with_tiebreak();
        self
    }

    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        self.query.projection = match &self.params.fields {
            Some(fields) => Projection::Include(fields.clone()),
            None => Projection::ExcludeInternal,
        };
        self
    }

    /// Page and limit, falling back to `defaults` and clamped to
    /// `defaults.max_limit` when one is configured.
    #[must_use]
    pub fn paginate(mut self, defaults: &PageDefaults) -> Self {
        let page = self.params.page.unwrap_or(1);
        let mut limit = self.params.limit.unwrap_or(defaults.default_limit);
        if let Some(max_limit) = defaults.max_limit {
            limit = limit.min(max_limit);
        }
        self.query.pagination = Pagination::new(page, limit);
        self
    }

    pub fn build(self) -> ListQuery {
        self.query
    }
}
