use serde::{Deserialize, Deserializer, Serialize};
use solar_calculator::{EstimateInput, Financing, InputLimits, Location, SolarEstimate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinanceOption {
    #[default]
    Cash,
    Loan,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub pincode: Option<String>,
    pub state: Option<String>,
    pub monthly_bill: f64,
    pub roof_area: f64,
    #[serde(default)]
    pub finance_option: FinanceOption,
    pub down_payment_percent: Option<f64>,
    pub tenure_years: Option<u32>,
}

impl EstimateRequest {
    /// Loan fields are ignored for cash purchases. A loan without a tenure
    /// uses the table's default; without a down payment, nothing is paid
    /// upfront.
    pub fn to_input(&self, limits: &InputLimits) -> EstimateInput {
        let financing = match self.finance_option {
            FinanceOption::Cash => Financing::Cash,
            FinanceOption::Loan => Financing::Loan {
                down_payment_fraction: self.down_payment_percent.unwrap_or(0.0) / 100.0,
                tenure_years: self
                    .tenure_years
                    .unwrap_or(limits.default_loan_tenure_years),
            },
        };

        EstimateInput {
            location: Location::from_parts(self.pincode.as_deref(), self.state.as_deref()),
            monthly_bill: self.monthly_bill,
            roof_area: self.roof_area,
            financing,
        }
    }
}

/// Postal codes arrive as either JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub success: bool,
    pub data: SolarEstimate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionsInfo {
    pub regions: Vec<String>,
    pub default_region: &'static str,
    pub limits: InputLimits,
}

#[derive(Debug, Serialize)]
pub struct RegionsResponse {
    pub success: bool,
    pub data: RegionsInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> InputLimits {
        InputLimits {
            min_monthly_bill: 500.0,
            min_roof_area: 50.0,
            default_loan_tenure_years: 5,
            max_loan_tenure_years: 30,
        }
    }

    fn request(body: serde_json::Value) -> EstimateRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn cash_is_the_default_finance_option() {
        let input = request(json!({ "monthlyBill": 3000, "roofArea": 500 })).to_input(&limits());
        assert_eq!(input.financing, Financing::Cash);
        assert_eq!(input.location, Location::Unspecified);
    }

    #[test]
    fn loan_defaults_tenure_and_down_payment() {
        let input = request(json!({
            "monthlyBill": 3000,
            "roofArea": 500,
            "financeOption": "loan"
        }))
        .to_input(&limits());
        assert_eq!(
            input.financing,
            Financing::Loan {
                down_payment_fraction: 0.0,
                tenure_years: 5
            }
        );
    }

    #[test]
    fn down_payment_percent_becomes_fraction() {
        let input = request(json!({
            "monthlyBill": 3000,
            "roofArea": 500,
            "financeOption": "loan",
            "downPaymentPercent": 25,
            "tenureYears": 7
        }))
        .to_input(&limits());
        assert_eq!(
            input.financing,
            Financing::Loan {
                down_payment_fraction: 0.25,
                tenure_years: 7
            }
        );
    }

    #[test]
    fn numeric_pincode_is_accepted() {
        let input = request(json!({
            "pincode": 110001,
            "state": "Kerala",
            "monthlyBill": 3000,
            "roofArea": 500
        }))
        .to_input(&limits());
        assert_eq!(input.location, Location::Pincode("110001".to_string()));
    }

    #[test]
    fn cash_ignores_loan_fields() {
        let input = request(json!({
            "monthlyBill": 3000,
            "roofArea": 500,
            "downPaymentPercent": 120,
            "tenureYears": 0
        }))
        .to_input(&limits());
        assert_eq!(input.financing, Financing::Cash);
    }

    #[test]
    fn out_of_range_loan_fields_pass_through_unchanged() {
        let input = request(json!({
            "monthlyBill": 3000,
            "roofArea": 500,
            "financeOption": "loan",
            "downPaymentPercent": 150,
            "tenureYears": 0
        }))
        .to_input(&limits());
        assert_eq!(
            input.financing,
            Financing::Loan {
                down_payment_fraction: 1.5,
                tenure_years: 0
            }
        );
    }

    #[test]
    fn unknown_finance_option_is_rejected() {
        let parsed: Result<EstimateRequest, _> = serde_json::from_value(json!({
            "monthlyBill": 3000,
            "roofArea": 500,
            "financeOption": "lease"
        }));
        assert!(parsed.is_err());
    }
}
