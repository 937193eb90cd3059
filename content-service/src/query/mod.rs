//! List-query pipeline shared by every content type: parse the query
//! string, assemble an immutable [`ListQuery`], then run it against MongoDB
//! or evaluate it in memory.

pub mod builder;
pub mod eval;
pub mod params;

pub use builder::{
    ListQuery, Pagination, PaginationMeta, Projection, QueryBuilder, SearchSpec, VERSION_KEY,
};
pub use params::{
    Condition, ListParams, PageDefaults, Scalar, SortDirection, SortKey, SortSpec,
    DEFAULT_PAGE_LIMIT, RESERVED_KEYS,
};
