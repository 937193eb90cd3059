//! Regional tariff, yield and cost tables.
//!
//! A [`RegionTable`] is loaded once (from the embedded data file or a path)
//! and then only read. Location lookups never fail: anything that cannot be
//! matched resolves to the table's explicit `default` entry.

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Key reported for estimates that fell back to the default entry.
pub const DEFAULT_REGION: &str = "default";

const BUILTIN_TABLE: &str = include_str!("../data/regions.json");

const PINCODE_LENGTH: usize = 6;

/// Upper bound on `maxLoanTenureYears` accepted from a table file.
pub const MAX_LOAN_TENURE_YEARS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeBracket {
    /// Inclusive upper bound of the bracket; `None` marks the open top bracket.
    #[serde(default)]
    pub up_to_kw: Option<f64>,
    pub cost_per_kw: f64,
    pub subsidy_per_kw: f64,
}

impl SizeBracket {
    fn contains(&self, system_size_kw: f64) -> bool {
        match self.up_to_kw {
            Some(limit) => system_size_kw <= limit,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionConfig {
    /// Grid tariff, currency per kWh.
    pub tariff_per_unit: f64,
    /// kWh generated per installed kW in the first year.
    pub yield_per_kw_per_year: f64,
    /// Roof area (sq ft) needed per installed kW.
    pub area_per_kw: f64,
    /// Cost and subsidy brackets, ascending by `up_to_kw`.
    pub brackets: Vec<SizeBracket>,
    pub panel_degradation_rate: f64,
    pub tariff_escalation_rate: f64,
    /// kg of CO2 avoided per kWh generated.
    pub co2_factor_per_unit: f64,
    /// Annual loan interest rate as a fraction.
    pub loan_interest_rate: f64,
}

impl RegionConfig {
    pub fn bracket_for(&self, system_size_kw: f64) -> Option<&SizeBracket> {
        self.brackets.iter().find(|b| b.contains(system_size_kw))
    }

    fn validate(&self, region: &str) -> Result<(), TableError> {
        let invalid = |reason: String| TableError::InvalidRegion {
            region: region.to_string(),
            reason,
        };

        for (name, value) in [
            ("tariffPerUnit", self.tariff_per_unit),
            ("yieldPerKwPerYear", self.yield_per_kw_per_year),
            ("areaPerKw", self.area_per_kw),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be positive (got {})", name, value)));
            }
        }

        for (name, value) in [
            ("panelDegradationRate", self.panel_degradation_rate),
            ("tariffEscalationRate", self.tariff_escalation_rate),
            ("loanInterestRate", self.loan_interest_rate),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(invalid(format!("{} must be in [0, 1) (got {})", name, value)));
            }
        }

        if !self.co2_factor_per_unit.is_finite() || self.co2_factor_per_unit < 0.0 {
            return Err(invalid(format!(
                "co2FactorPerUnit must not be negative (got {})",
                self.co2_factor_per_unit
            )));
        }

        let Some((last, bounded)) = self.brackets.split_last() else {
            return Err(invalid("at least one cost bracket is required".to_string()));
        };
        if last.up_to_kw.is_some() {
            return Err(invalid("the last bracket must be open (upToKw: null)".to_string()));
        }

        let mut previous = 0.0;
        for bracket in bounded {
            match bracket.up_to_kw {
                Some(limit) if limit.is_finite() && limit > previous => previous = limit,
                Some(limit) => {
                    return Err(invalid(format!(
                        "bracket bounds must be strictly ascending (got {} after {})",
                        limit, previous
                    )));
                }
                None => return Err(invalid("only the last bracket may be open".to_string())),
            }
        }

        for bracket in &self.brackets {
            if !bracket.cost_per_kw.is_finite() || bracket.cost_per_kw < 0.0 {
                return Err(invalid(format!(
                    "costPerKw must not be negative (got {})",
                    bracket.cost_per_kw
                )));
            }
            if !(0.0..=bracket.cost_per_kw).contains(&bracket.subsidy_per_kw) {
                return Err(invalid(format!(
                    "subsidyPerKw must be between 0 and costPerKw (got {})",
                    bracket.subsidy_per_kw
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputLimits {
    pub min_monthly_bill: f64,
    /// Smallest roof (sq ft) an estimate is offered for.
    pub min_roof_area: f64,
    pub default_loan_tenure_years: u32,
    pub max_loan_tenure_years: u32,
}

/// Where the customer is. Postal codes win over state names when both are
/// supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Pincode(String),
    State(String),
    Unspecified,
}

impl Location {
    pub fn from_parts(pincode: Option<&str>, state: Option<&str>) -> Self {
        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(pincode) = non_empty(pincode) {
            Location::Pincode(pincode)
        } else if let Some(state) = non_empty(state) {
            Location::State(state)
        } else {
            Location::Unspecified
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedRegion<'a> {
    pub key: &'a str,
    pub config: &'a RegionConfig,
    /// True when the location was not recognised and the default entry is used.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTable {
    pub limits: InputLimits,
    pub default: RegionConfig,
    #[serde(default)]
    pub regions: BTreeMap<String, RegionConfig>,
    /// Leading pincode digits to region key; the longest matching prefix wins.
    #[serde(default)]
    pub pincode_prefixes: BTreeMap<String, String>,
    /// Alternate state or city spellings to region key.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl RegionTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Result<Self, TableError> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse, normalise keys and validate a table.
    pub fn from_json(raw: &str) -> Result<Self, TableError> {
        let parsed: RegionTable = serde_json::from_str(raw)?;

        let table = RegionTable {
            limits: parsed.limits,
            default: parsed.default,
            regions: parsed
                .regions
                .into_iter()
                .map(|(key, config)| (normalize_key(&key), config))
                .collect(),
            pincode_prefixes: parsed
                .pincode_prefixes
                .into_iter()
                .map(|(prefix, region)| (prefix.trim().to_string(), normalize_key(&region)))
                .collect(),
            aliases: parsed
                .aliases
                .into_iter()
                .map(|(alias, region)| (normalize_key(&alias), normalize_key(&region)))
                .collect(),
        };

        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), TableError> {
        let limits = &self.limits;
        if !limits.min_monthly_bill.is_finite() || limits.min_monthly_bill < 0.0 {
            return Err(TableError::InvalidLimits(format!(
                "minMonthlyBill must not be negative (got {})",
                limits.min_monthly_bill
            )));
        }
        if !limits.min_roof_area.is_finite() || limits.min_roof_area < 0.0 {
            return Err(TableError::InvalidLimits(format!(
                "minRoofArea must not be negative (got {})",
                limits.min_roof_area
            )));
        }
        if limits.max_loan_tenure_years == 0 || limits.max_loan_tenure_years > MAX_LOAN_TENURE_YEARS {
            return Err(TableError::InvalidLimits(format!(
                "maxLoanTenureYears must be between 1 and {} (got {})",
                MAX_LOAN_TENURE_YEARS, limits.max_loan_tenure_years
            )));
        }
        if limits.default_loan_tenure_years == 0
            || limits.default_loan_tenure_years > limits.max_loan_tenure_years
        {
            return Err(TableError::InvalidLimits(format!(
                "defaultLoanTenureYears must be between 1 and {} (got {})",
                limits.max_loan_tenure_years, limits.default_loan_tenure_years
            )));
        }

        self.default.validate(DEFAULT_REGION)?;
        for (key, config) in &self.regions {
            if key == DEFAULT_REGION {
                return Err(TableError::InvalidRegion {
                    region: key.clone(),
                    reason: "the default entry belongs under 'default', not 'regions'".to_string(),
                });
            }
            config.validate(key)?;
        }

        for (prefix, region) in &self.pincode_prefixes {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
                return Err(TableError::InvalidLimits(format!(
                    "pincode prefix '{}' must be digits only",
                    prefix
                )));
            }
            self.ensure_known(prefix, region)?;
        }
        for (alias, region) in &self.aliases {
            self.ensure_known(alias, region)?;
        }

        Ok(())
    }

    fn ensure_known(&self, key: &str, region: &str) -> Result<(), TableError> {
        if region == DEFAULT_REGION || self.regions.contains_key(region) {
            Ok(())
        } else {
            Err(TableError::UnknownRegion {
                key: key.to_string(),
                region: region.to_string(),
            })
        }
    }

    pub fn region_keys(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Map a location to its region parameters, falling back to the default
    /// entry for anything unrecognised.
    pub fn resolve(&self, location: &Location) -> ResolvedRegion<'_> {
        let key = match location {
            Location::Pincode(pincode) => self.region_for_pincode(pincode),
            Location::State(state) => {
                let normalized = normalize_key(state);
                Some(self.aliases.get(&normalized).cloned().unwrap_or(normalized))
            }
            Location::Unspecified => None,
        };

        match key.and_then(|k| self.regions.get_key_value(&k)) {
            Some((key, config)) => ResolvedRegion {
                key,
                config,
                fallback: false,
            },
            None => {
                tracing::debug!(?location, "No region matched location, using default");
                ResolvedRegion {
                    key: DEFAULT_REGION,
                    config: &self.default,
                    fallback: true,
                }
            }
        }
    }

    fn region_for_pincode(&self, pincode: &str) -> Option<String> {
        let digits: String = pincode.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != PINCODE_LENGTH || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        self.pincode_prefixes
            .iter()
            .filter(|(prefix, _)| digits.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, region)| region.clone())
    }
}

/// Lowercase, with `_`/`-` treated as spaces and runs of whitespace collapsed.
pub fn normalize_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
