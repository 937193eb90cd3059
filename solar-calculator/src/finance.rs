//! Loan amortisation for financed installations.

use serde::Serialize;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Monthly rates below this are treated as interest free; the annuity
/// formula divides by `(1 + r)^n - 1`, which vanishes as `r` approaches zero.
const ZERO_RATE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub principal: f64,
    pub down_payment: f64,
    pub annual_interest_rate: f64,
    pub tenure_months: u32,
    pub monthly_payment: f64,
    pub total_interest: f64,
}

/// Level monthly payment repaying `principal` over `months` at `annual_rate`.
pub fn monthly_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return principal;
    }

    let n = f64::from(months);
    let r = annual_rate / f64::from(MONTHS_PER_YEAR);
    if r.abs() < ZERO_RATE_EPSILON {
        return principal / n;
    }

    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

/// Finance `net_cost` after a down payment of `down_payment_fraction`.
pub fn amortize(
    net_cost: f64,
    down_payment_fraction: f64,
    annual_rate: f64,
    tenure_years: u32,
) -> LoanSummary {
    let down_payment = net_cost * down_payment_fraction;
    let principal = net_cost - down_payment;
    let tenure_months = tenure_years * MONTHS_PER_YEAR;
    let payment = monthly_payment(principal, annual_rate, tenure_months);

    LoanSummary {
        principal,
        down_payment,
        annual_interest_rate: annual_rate,
        tenure_months,
        monthly_payment: payment,
        total_interest: payment * f64::from(tenure_months) - principal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_linear() {
        let payment = monthly_payment(120_000.0, 0.0, 60);
        assert_eq!(payment, 2_000.0);
    }

    #[test]
    fn annuity_matches_reference_value() {
        // 1,00,000 at 12% p.a. over 12 months
        let payment = monthly_payment(100_000.0, 0.12, 12);
        assert!((payment - 8_884.878_867_834).abs() < 1e-6, "payment = {}", payment);
    }

    #[test]
    fn amortize_splits_down_payment() {
        let loan = amortize(100_000.0, 0.2, 0.0, 5);
        assert_eq!(loan.down_payment, 20_000.0);
        assert_eq!(loan.principal, 80_000.0);
        assert_eq!(loan.tenure_months, 60);
        assert!((loan.monthly_payment - 80_000.0 / 60.0).abs() < 1e-9);
        assert!(loan.total_interest.abs() < 1e-6);
    }

    #[test]
    fn interest_accrues_with_positive_rate() {
        let loan = amortize(100_000.0, 0.0, 0.09, 5);
        assert!(loan.monthly_payment > 100_000.0 / 60.0);
        assert!(loan.total_interest > 0.0);
    }

    #[test]
    fn fully_paid_upfront_needs_no_loan() {
        let loan = amortize(50_000.0, 1.0, 0.09, 3);
        assert_eq!(loan.principal, 0.0);
        assert_eq!(loan.monthly_payment, 0.0);
    }
}
