pub mod content;
pub mod health;
pub mod solar;

pub use content::{get_content, list_content};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use solar::{estimate_solar, list_regions};
