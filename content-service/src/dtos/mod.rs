pub mod content;
pub mod solar;

pub use content::{document_to_json, ItemResponse, ListResponse};
pub use solar::{EstimateRequest, EstimateResponse, FinanceOption, RegionsInfo, RegionsResponse};
