use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    entities::order::{self, LocationMode},
    errors::ApiError,
    services::checkout::{
        CartLine, CheckoutIntent, CreateOrderInput, DeliveryAddress, DeliverySlot,
        VerifyPaymentInput,
    },
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Creates the router for checkout endpoints.
///
/// `/verify` takes no `AuthUser`: the access token may have expired during
/// the external payment round-trip.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/verify", post(verify_payment))
}

/// Start a checkout: price the cart, open a gateway order, persist the order.
async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateOrderInput {
        items: payload
            .items
            .into_iter()
            .map(|l| CartLine {
                meal_id: l.meal_id,
                quantity: l.qty,
            })
            .collect(),
        address: payload.address.into(),
        delivery_slot: DeliverySlot {
            date: payload.delivery_slot.date,
            time: payload.delivery_slot.time,
        },
        coupon_code: payload.coupon_code,
    };

    let intent = state
        .services
        .checkout
        .create_order(user.user_id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CheckoutIntentResponse::from(intent)))
}

/// Settle a payment after the gateway round-trip.
async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .verify_payment(VerifyPaymentInput {
            order_id: payload.order_id,
            gateway_order_id: payload.gateway_order_id,
            gateway_payment_id: payload.gateway_payment_id,
            gateway_signature: payload.gateway_signature,
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(VerifyPaymentResponse {
        message: "Payment verified successfully".to_string(),
        order,
    }))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Cart is empty"))]
    pub items: Vec<CartLineRequest>,
    pub address: AddressRequest,
    pub delivery_slot: DeliverySlotRequest,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub meal_id: Uuid,
    pub qty: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub line1: String,
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    pub location_mode: Option<LocationMode>,
    #[serde(default)]
    pub location_text: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub maps_url: String,
}

impl From<AddressRequest> for DeliveryAddress {
    fn from(req: AddressRequest) -> Self {
        DeliveryAddress {
            full_name: req.full_name,
            phone: req.phone,
            line1: req.line1,
            line2: req.line2,
            city: req.city,
            state: req.state,
            pincode: req.pincode,
            location_mode: req.location_mode,
            location_text: req.location_text,
            lat: req.lat,
            lng: req.lng,
            maps_url: req.maps_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeliverySlotRequest {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutIntentResponse {
    pub key_id: String,
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: Uuid,
}

impl From<CheckoutIntent> for CheckoutIntentResponse {
    fn from(intent: CheckoutIntent) -> Self {
        Self {
            key_id: intent.key_id,
            gateway_order_id: intent.gateway_order_id,
            amount: intent.amount,
            currency: intent.currency,
            order_id: intent.order_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: Uuid,
    #[validate(length(min = 1, message = "Missing payment verification fields"))]
    pub gateway_order_id: String,
    #[validate(length(min = 1, message = "Missing payment verification fields"))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1, message = "Missing payment verification fields"))]
    pub gateway_signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub message: String,
    pub order: order::Model,
}
