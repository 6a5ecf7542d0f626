use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    auth::AdminUser,
    entities::coupon::CouponKind,
    errors::ApiError,
    services::coupons::CouponDraft,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{patch, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Creates the router for admin coupon management
pub fn admin_coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_coupon).get(list_coupons))
        .route("/:id", patch(update_coupon).delete(delete_coupon))
        .route("/:id/toggle", patch(toggle_coupon))
}

async fn create_coupon(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CouponPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .coupons
        .create(payload.into())
        .await
        .map_err(map_service_error)?;

    Ok(created_response(created))
}

async fn list_coupons(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let coupons = state
        .services
        .coupons
        .list()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(coupons))
}

async fn toggle_coupon(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupons
        .toggle(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(coupon))
}

async fn update_coupon(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CouponPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .coupons
        .update(id, payload.into())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

async fn delete_coupon(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .coupons
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "message": "Coupon deleted"
    })))
}

// Request DTOs

/// Create/edit payload. Date fields accept either an RFC 3339 timestamp or a
/// bare `YYYY-MM-DD` (admin UIs send both).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPayload {
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: Option<CouponKind>,
    pub value: Option<i64>,
    pub min_cart_total: Option<i64>,
    pub max_discount: Option<i64>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit_total: Option<i64>,
    pub usage_limit_per_user: Option<i64>,
    pub is_active: Option<bool>,
}

impl From<CouponPayload> for CouponDraft {
    fn from(payload: CouponPayload) -> Self {
        CouponDraft {
            code: payload.code,
            kind: payload.kind,
            value: payload.value,
            min_cart_total: payload.min_cart_total,
            max_discount: payload.max_discount,
            valid_from: payload.valid_from,
            valid_to: payload.valid_to,
            expires_at: payload.expires_at,
            usage_limit_total: payload.usage_limit_total,
            usage_limit_per_user: payload.usage_limit_per_user,
            is_active: payload.is_active,
        }
    }
}

fn flexible_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(instant.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time")
            .and_utc();
        return Ok(Some(midnight));
    }

    Err(serde::de::Error::custom(format!(
        "invalid date value: {raw}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accepts_bare_dates() {
        let payload: CouponPayload = serde_json::from_value(serde_json::json!({
            "code": "save10",
            "type": "percent",
            "value": 10,
            "validTo": "2026-04-01"
        }))
        .unwrap();

        let to = payload.valid_to.unwrap();
        assert_eq!(to.to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }

    #[test]
    fn payload_accepts_rfc3339_timestamps() {
        let payload: CouponPayload = serde_json::from_value(serde_json::json!({
            "code": "save10",
            "validFrom": "2026-04-01T09:30:00+05:30"
        }))
        .unwrap();

        let from = payload.valid_from.unwrap();
        assert_eq!(from.to_rfc3339(), "2026-04-01T04:00:00+00:00");
    }

    #[test]
    fn payload_rejects_garbage_dates() {
        let result: Result<CouponPayload, _> = serde_json::from_value(serde_json::json!({
            "code": "save10",
            "validTo": "next tuesday"
        }));
        assert!(result.is_err());
    }
}
