//! HTTP routes over the FX engine.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use exrates_common::CurrencyCode;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult, INVALID_AMOUNT};
use crate::state::AppState;

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/exchange-rates", get(get_exchange_rates))
        .route("/convert", get(convert_currency))
        .route("/supported-currencies", get(get_supported_currencies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rate table of the current snapshot.
async fn get_exchange_rates(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let snapshot = state.engine.get_rates().await?;
    Ok(Json(snapshot.table()).into_response())
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    amount: f64,
    from_currency: String,
    to_currency: String,
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    converted_amount: String,
}

/// Convert an amount between two currencies.
async fn convert_currency(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<Json<ConvertResponse>> {
    if !query.amount.is_finite() {
        return Err(ApiError::BadRequest(INVALID_AMOUNT));
    }

    let conversion = state
        .engine
        .convert(
            query.amount,
            &CurrencyCode::new(query.from_currency),
            &CurrencyCode::new(query.to_currency),
        )
        .await?;

    Ok(Json(ConvertResponse {
        converted_amount: format_amount(conversion.converted_amount),
    }))
}

#[derive(Debug, Serialize)]
struct CurrenciesResponse {
    currencies: Vec<CurrencyCode>,
}

/// Currency codes of the current snapshot.
async fn get_supported_currencies(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CurrenciesResponse>> {
    let currencies = state.engine.supported_currencies().await?;
    Ok(Json(CurrenciesResponse { currencies }))
}

/// Render an amount the way clients of the service expect.
///
/// Uses the shortest representation that round-trips. Integral values keep a
/// trailing `.0`. Magnitudes of at least 1e16 or below 1e-4 switch to
/// exponent notation with a signed, two-digit exponent (`1e+16`, `2.5e-05`).
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let rendered = format!("{:e}", value);
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => rendered,
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
