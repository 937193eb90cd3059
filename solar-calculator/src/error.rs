use thiserror::Error;

/// Why an estimate could not be produced.
///
/// Input variants name the offending field (see [`EstimateError::field`]) so
/// callers can attach the message to the right form control.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("Monthly bill must be at least {minimum} (got {actual})")]
    BillTooLow { minimum: f64, actual: f64 },

    #[error("Roof area must be at least {minimum} sq ft (got {actual})")]
    RoofTooSmall { minimum: f64, actual: f64 },

    #[error("Down payment fraction must be between 0 and 1 (got {fraction})")]
    InvalidDownPayment { fraction: f64 },

    #[error("Loan tenure must be between 1 and {maximum} years (got {actual})")]
    InvalidLoanTenure { maximum: u32, actual: u32 },

    #[error("Annual savings in region '{region}' are zero; payback is undefined")]
    ZeroSavings { region: String },

    #[error("Region '{region}' has no cost bracket for a {system_size_kw} kW system")]
    NoCostBracket { region: String, system_size_kw: f64 },
}

impl EstimateError {
    /// Request field the error refers to, in the wire (camelCase) spelling.
    pub fn field(&self) -> &'static str {
        match self {
            EstimateError::BillTooLow { .. } => "monthlyBill",
            EstimateError::RoofTooSmall { .. } => "roofArea",
            EstimateError::InvalidDownPayment { .. } => "downPaymentPercent",
            EstimateError::InvalidLoanTenure { .. } => "tenureYears",
            EstimateError::ZeroSavings { .. } | EstimateError::NoCostBracket { .. } => "region",
        }
    }
}

/// Problems loading or validating a region table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to parse region table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read region table from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input limits: {0}")]
    InvalidLimits(String),

    #[error("Invalid region '{region}': {reason}")]
    InvalidRegion { region: String, reason: String },

    #[error("'{key}' points at unknown region '{region}'")]
    UnknownRegion { key: String, region: String },
}
