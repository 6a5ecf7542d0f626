use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    entities::coupon::{self, CouponKind},
    errors::ApiError,
    AppState,
};
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Creates the router for user-facing coupon endpoints
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/apply", post(apply_coupon))
        .route("/available", get(available_coupons))
}

/// Preview a coupon against the current cart value.
///
/// Unknown and inactive codes get the same rejection so callers cannot probe
/// for unissued codes.
async fn apply_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplyCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let quote = state
        .services
        .coupons
        .apply(user.user_id, &payload.code, payload.cart_total)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(quote))
}

/// Coupons the caller could use for a cart of the given value.
async fn available_coupons(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AvailableCouponsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let coupons = state
        .services
        .coupons
        .available_for(user.user_id, query.cart_total.unwrap_or(0))
        .await
        .map_err(map_service_error)?;

    let summaries: Vec<CouponSummary> = coupons.into_iter().map(CouponSummary::from).collect();
    Ok(success_response(summaries))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, message = "Coupon code required"))]
    pub code: String,
    #[serde(default)]
    pub cart_total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCouponsQuery {
    pub cart_total: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub value: i64,
    pub min_cart_total: i64,
    pub max_discount: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl From<coupon::Model> for CouponSummary {
    fn from(model: coupon::Model) -> Self {
        Self {
            code: model.code,
            kind: model.kind,
            value: model.value,
            min_cart_total: model.min_cart_total,
            max_discount: model.max_discount,
            valid_from: model.valid_from,
            valid_to: model.valid_to,
        }
    }
}
