//! solar-calculator: rooftop solar sizing and savings estimates.
//!
//! [`estimate`] is a pure function of its input and a read-only
//! [`RegionTable`]; it does no I/O and keeps no state, so a single table can
//! be shared across threads and requests.
//!
//! ```
//! use solar_calculator::{estimate, EstimateInput, Financing, Location, RegionTable};
//!
//! let table = RegionTable::builtin().unwrap();
//! let result = estimate(
//!     &table,
//!     &EstimateInput {
//!         location: Location::Unspecified,
//!         monthly_bill: 3000.0,
//!         roof_area: 500.0,
//!         financing: Financing::Cash,
//!     },
//! )
//! .unwrap();
//! assert_eq!(result.system_size_kw, 3.0);
//! ```
pub mod error;
pub mod estimate;
pub mod finance;
pub mod region;

pub use error::{EstimateError, TableError};
pub use estimate::{
    estimate, EstimateInput, Financing, SolarEstimate, YearProjection, MIN_SYSTEM_SIZE_KW,
    PROJECTION_YEARS,
};
pub use finance::LoanSummary;
pub use region::{
    InputLimits, Location, RegionConfig, RegionTable, ResolvedRegion, SizeBracket, DEFAULT_REGION,
};
