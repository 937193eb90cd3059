use crate::dtos::{EstimateRequest, EstimateResponse, RegionsInfo, RegionsResponse};
use crate::startup::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use metrics::counter;
use service_core::error::AppError;
use solar_calculator::{EstimateError, DEFAULT_REGION};

fn estimate_error(err: EstimateError) -> AppError {
    AppError::field(err.field(), err.to_string())
}

/// `POST /api/solar/estimate`
///
/// Every input check happens in the estimator; a rejection names the request
/// field that failed.
pub async fn estimate_solar(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

    let input = request.to_input(&state.regions.limits);
    match solar_calculator::estimate(&state.regions, &input) {
        Ok(estimate) => {
            counter!("solar_estimates_total", "outcome" => "ok").increment(1);
            tracing::info!(
                region = %estimate.region,
                region_fallback = estimate.region_fallback,
                system_size_kw = estimate.system_size_kw,
                "Produced solar estimate"
            );
            Ok(Json(EstimateResponse {
                success: true,
                data: estimate,
            }))
        }
        Err(err) => {
            counter!("solar_estimates_total", "outcome" => "rejected").increment(1);
            tracing::info!(field = err.field(), error = %err, "Rejected solar estimate");
            Err(estimate_error(err))
        }
    }
}

/// `GET /api/solar/regions`: known regions and input minimums for form hints.
pub async fn list_regions(State(state): State<AppState>) -> Json<RegionsResponse> {
    Json(RegionsResponse {
        success: true,
        data: RegionsInfo {
            regions: state.regions.region_keys().map(str::to_string).collect(),
            default_region: DEFAULT_REGION,
            limits: state.regions.limits.clone(),
        },
    })
}
