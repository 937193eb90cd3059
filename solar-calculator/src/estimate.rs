//! System sizing and 25-year financial projection.

use crate::error::EstimateError;
use crate::finance::{self, LoanSummary};
use crate::region::{Location, RegionTable};
use serde::Serialize;

pub const PROJECTION_YEARS: u32 = 25;

/// Smallest system ever recommended, in kW.
pub const MIN_SYSTEM_SIZE_KW: f64 = 1.0;

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Financing {
    Cash,
    Loan {
        /// Share of the net cost paid upfront, in `[0, 1]`.
        down_payment_fraction: f64,
        tenure_years: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimateInput {
    pub location: Location,
    /// Average monthly electricity bill, in currency.
    pub monthly_bill: f64,
    /// Shade-free roof area available, in sq ft.
    pub roof_area: f64,
    pub financing: Financing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    pub year: u32,
    pub generation_kwh: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarEstimate {
    pub region: String,
    pub region_fallback: bool,
    pub demand_kw: f64,
    pub roof_kw: f64,
    pub system_size_kw: f64,
    pub required_roof_area: f64,
    /// The roof, not consumption, determined the system size.
    pub roof_limited: bool,
    /// Even the 1 kW minimum does not fit on the roof.
    pub insufficient_roof: bool,
    pub gross_cost: f64,
    pub subsidy_amount: f64,
    pub net_cost: f64,
    pub annual_generation_year1: f64,
    pub annual_savings_year1: f64,
    pub payback_years: f64,
    pub lifetime_savings_25_year: f64,
    pub co2_saved_kg: f64,
    pub monthly_loan_payment: Option<f64>,
    pub loan: Option<LoanSummary>,
    pub yearly: Vec<YearProjection>,
}

/// Size a rooftop system and project its costs and savings.
///
/// All inputs are validated before anything is computed; the first failing
/// check is returned and no partial estimate is produced.
pub fn estimate(table: &RegionTable, input: &EstimateInput) -> Result<SolarEstimate, EstimateError> {
    validate(table, input)?;

    let resolved = table.resolve(&input.location);
    let region = resolved.config;

    let annual_units = input.monthly_bill / region.tariff_per_unit * MONTHS_PER_YEAR;
    let demand_kw = annual_units / region.yield_per_kw_per_year;
    let roof_kw = input.roof_area / region.area_per_kw;

    let system_size_kw = demand_kw.min(roof_kw).max(MIN_SYSTEM_SIZE_KW);
    let roof_limited = roof_kw < demand_kw;
    let insufficient_roof = roof_kw < MIN_SYSTEM_SIZE_KW;

    let bracket = region
        .bracket_for(system_size_kw)
        .ok_or_else(|| EstimateError::NoCostBracket {
            region: resolved.key.to_string(),
            system_size_kw,
        })?;

    let gross_cost = system_size_kw * bracket.cost_per_kw;
    let subsidy_amount = system_size_kw * bracket.subsidy_per_kw;
    let net_cost = gross_cost - subsidy_amount;

    let annual_generation_year1 = system_size_kw * region.yield_per_kw_per_year;
    let annual_savings_year1 = annual_generation_year1 * region.tariff_per_unit;
    if !annual_savings_year1.is_finite() || annual_savings_year1 <= 0.0 {
        return Err(EstimateError::ZeroSavings {
            region: resolved.key.to_string(),
        });
    }
    let payback_years = net_cost / annual_savings_year1;

    let mut yearly = Vec::with_capacity(PROJECTION_YEARS as usize);
    let mut lifetime_savings_25_year = 0.0;
    let mut co2_saved_kg = 0.0;
    for n in 0..PROJECTION_YEARS {
        let exponent = n as i32;
        let generation_kwh =
            annual_generation_year1 * (1.0 - region.panel_degradation_rate).powi(exponent);
        let savings = generation_kwh
            * region.tariff_per_unit
            * (1.0 + region.tariff_escalation_rate).powi(exponent);

        lifetime_savings_25_year += savings;
        co2_saved_kg += generation_kwh * region.co2_factor_per_unit;
        yearly.push(YearProjection {
            year: n + 1,
            generation_kwh,
            savings,
        });
    }

    let loan = match input.financing {
        Financing::Cash => None,
        Financing::Loan {
            down_payment_fraction,
            tenure_years,
        } => Some(finance::amortize(
            net_cost,
            down_payment_fraction,
            region.loan_interest_rate,
            tenure_years,
        )),
    };

    tracing::debug!(
        region = resolved.key,
        fallback = resolved.fallback,
        demand_kw,
        roof_kw,
        system_size_kw,
        "Solar estimate computed"
    );

    Ok(SolarEstimate {
        region: resolved.key.to_string(),
        region_fallback: resolved.fallback,
        demand_kw,
        roof_kw,
        system_size_kw,
        required_roof_area: system_size_kw * region.area_per_kw,
        roof_limited,
        insufficient_roof,
        gross_cost,
        subsidy_amount,
        net_cost,
        annual_generation_year1,
        annual_savings_year1,
        payback_years,
        lifetime_savings_25_year,
        co2_saved_kg,
        monthly_loan_payment: loan.as_ref().map(|l| l.monthly_payment),
        loan,
        yearly,
    })
}

fn validate(table: &RegionTable, input: &EstimateInput) -> Result<(), EstimateError> {
    let limits = &table.limits;

    if !input.monthly_bill.is_finite() || input.monthly_bill < limits.min_monthly_bill {
        return Err(EstimateError::BillTooLow {
            minimum: limits.min_monthly_bill,
            actual: input.monthly_bill,
        });
    }

    if !input.roof_area.is_finite() || input.roof_area < limits.min_roof_area {
        return Err(EstimateError::RoofTooSmall {
            minimum: limits.min_roof_area,
            actual: input.roof_area,
        });
    }

    if let Financing::Loan {
        down_payment_fraction,
        tenure_years,
    } = input.financing
    {
        if !(0.0..=1.0).contains(&down_payment_fraction) {
            return Err(EstimateError::InvalidDownPayment {
                fraction: down_payment_fraction,
            });
        }
        if tenure_years == 0 || tenure_years > limits.max_loan_tenure_years {
            return Err(EstimateError::InvalidLoanTenure {
                maximum: limits.max_loan_tenure_years,
                actual: tenure_years,
            });
        }
    }

    Ok(())
}
