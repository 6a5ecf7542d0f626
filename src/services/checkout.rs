//! Checkout orchestration: create-order and verify-payment.
//!
//! create-order validates the cart, address and slot, prices the cart from
//! the meal catalog (client snapshots are ignored), previews the coupon, and
//! opens a gateway order before persisting anything. verify-payment checks
//! the gateway signature, drives the one-shot payment transition, and hands
//! paid orders to the coupon ledger.

use crate::{
    entities::{
        meal,
        order::{self, LocationMode, PaymentStatus},
        order_item, Meal, Order,
    },
    errors::ServiceError,
    gateway::{self, PaymentGateway},
    services::{
        coupons::{CouponService, RedemptionOutcome},
        delivery_slot::SlotPolicy,
        pricing::{self, PricedLine},
    },
};
use chrono::{Local, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const PAYMENT_PROVIDER: &str = "razorpay";

/// One cart line as submitted by the client; everything else about the meal
/// is re-read from the catalog.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub meal_id: Uuid,
    pub quantity: i64,
}

/// Delivery address as captured at checkout.
#[derive(Debug, Clone)]
pub struct DeliveryAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub location_mode: Option<LocationMode>,
    pub location_text: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub maps_url: String,
}

#[derive(Debug, Clone)]
pub struct DeliverySlot {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub items: Vec<CartLine>,
    pub address: DeliveryAddress,
    pub delivery_slot: DeliverySlot,
    pub coupon_code: Option<String>,
}

/// Everything a client needs to drive the gateway's payment widget.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutIntent {
    pub key_id: String,
    pub gateway_order_id: String,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub order_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct VerifyPaymentInput {
    pub order_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    coupons: Arc<CouponService>,
    gateway: Arc<dyn PaymentGateway>,
    slot_policy: SlotPolicy,
    currency: String,
    gateway_secret: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        coupons: Arc<CouponService>,
        gateway: Arc<dyn PaymentGateway>,
        slot_policy: SlotPolicy,
        currency: String,
        gateway_secret: String,
    ) -> Self {
        Self {
            db,
            coupons,
            gateway,
            slot_policy,
            currency,
            gateway_secret,
        }
    }

    /// Validates the cart, opens a gateway order for the payable amount, and
    /// persists the order in `created` state. Nothing is persisted when any
    /// validation or the gateway call fails.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> Result<CheckoutIntent, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".to_string()));
        }
        validate_address(&input.address)?;

        self.slot_policy
            .check(
                &input.delivery_slot.date,
                &input.delivery_slot.time,
                Local::now().naive_local(),
            )
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        for line in &input.items {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(
                    "Invalid quantity".to_string(),
                ));
            }
        }

        // Normalize lines from the catalog; only the meal id is trusted.
        let meal_ids: Vec<Uuid> = input.items.iter().map(|l| l.meal_id).collect();
        let meals: HashMap<Uuid, meal::Model> = Meal::find()
            .filter(meal::Column::Id.is_in(meal_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut priced = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let meal = meals.get(&line.meal_id).ok_or_else(|| {
                ServiceError::ValidationError("Unknown meal in cart".to_string())
            })?;
            priced.push((
                meal,
                PricedLine {
                    unit_price: meal.price,
                    protein_per_unit: meal.protein,
                    calories_per_unit: meal.calories,
                    quantity: line.quantity,
                },
            ));
        }

        let totals =
            pricing::compute_totals(&priced.iter().map(|(_, l)| *l).collect::<Vec<_>>());

        let mut coupon_code = None;
        let mut discount = 0;
        if let Some(code) = input
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let coupon = self.coupons.find_by_code(code).await?.ok_or_else(|| {
                ServiceError::IneligibleCoupon("Invalid coupon".to_string())
            })?;
            discount = self
                .coupons
                .eligible_discount(&coupon, user_id, totals.subtotal, Utc::now())
                .await?;
            coupon_code = Some(coupon.code);
        }

        let payable = (totals.subtotal - discount).max(0);
        let order_id = Uuid::new_v4();
        let receipt = format!("rcpt_{}", order_id.simple());

        // Gateway first: a failure here must leave no Order behind.
        let gateway_order = self
            .gateway
            .create_order(payable * 100, &self.currency, &receipt)
            .await
            .map_err(|err| {
                warn!(error = %err, "gateway order creation failed");
                ServiceError::PaymentUnavailable(err.to_string())
            })?;

        let now = Utc::now();
        let address = input.address;
        let txn = self.db.begin().await?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            subtotal: Set(totals.subtotal),
            discount: Set(discount),
            payable: Set(payable),
            total_protein: Set(totals.total_protein),
            total_calories: Set(totals.total_calories),
            coupon_code: Set(coupon_code.clone()),
            coupon_discount: Set(discount),
            coupon_redeemed: Set(false),
            full_name: Set(address.full_name),
            phone: Set(address.phone),
            line1: Set(address.line1),
            line2: Set(address.line2),
            city: Set(address.city),
            state: Set(address.state),
            pincode: Set(address.pincode),
            location_mode: Set(address.location_mode.unwrap_or(LocationMode::Manual)),
            location_text: Set(address.location_text),
            lat: Set(address.lat),
            lng: Set(address.lng),
            maps_url: Set(address.maps_url),
            slot_date: Set(input.delivery_slot.date),
            slot_time: Set(input.delivery_slot.time),
            payment_provider: Set(PAYMENT_PROVIDER.to_string()),
            payment_status: Set(PaymentStatus::Created),
            gateway_order_id: Set(gateway_order.id.clone()),
            gateway_payment_id: Set(None),
            gateway_signature: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        order_model.insert(&txn).await?;

        for (meal, line) in &priced {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                meal_id: Set(meal.id),
                title: Set(meal.title.clone()),
                unit_price: Set(line.unit_price),
                protein_per_unit: Set(line.protein_per_unit),
                calories_per_unit: Set(line.calories_per_unit),
                quantity: Set(line.quantity),
                created_at: Set(now),
            };
            item.insert(&txn).await?;
        }

        txn.commit().await?;

        info!(%order_id, subtotal = totals.subtotal, payable, "order created");
        Ok(CheckoutIntent {
            key_id: self.gateway.key_id().to_string(),
            gateway_order_id: gateway_order.id,
            amount: payable * 100,
            currency: self.currency.clone(),
            order_id,
        })
    }

    /// Verifies the gateway signature and settles the order.
    ///
    /// Replays of an already-paid order return it unchanged; a bad signature
    /// or gateway-order mismatch is terminal for the order. Reachable
    /// without a live session token.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn verify_payment(
        &self,
        input: VerifyPaymentInput,
    ) -> Result<order::Model, ServiceError> {
        let order = Order::find_by_id(input.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        // Duplicate client calls after success are expected; replay the result.
        if order.payment_status == PaymentStatus::Paid {
            return Ok(order);
        }

        // A signature for some other gateway order proves nothing about this one.
        if order.gateway_order_id != input.gateway_order_id {
            return Err(ServiceError::PaymentVerification(
                "Payment order mismatch".to_string(),
            ));
        }

        let now = Utc::now();
        let genuine = gateway::verify_payment_signature(
            &self.gateway_secret,
            &input.gateway_order_id,
            &input.gateway_payment_id,
            &input.gateway_signature,
        );

        if !genuine {
            Order::update_many()
                .col_expr(
                    order::Column::PaymentStatus,
                    Expr::value(PaymentStatus::Failed),
                )
                .col_expr(
                    order::Column::GatewayPaymentId,
                    Expr::value(input.gateway_payment_id.clone()),
                )
                .col_expr(
                    order::Column::GatewaySignature,
                    Expr::value(input.gateway_signature.clone()),
                )
                .col_expr(order::Column::UpdatedAt, Expr::value(now))
                .filter(order::Column::Id.eq(order.id))
                .filter(order::Column::PaymentStatus.eq(PaymentStatus::Created))
                .exec(&*self.db)
                .await?;

            warn!(order_id = %order.id, "payment signature verification failed");
            return Err(ServiceError::PaymentVerification(
                "Payment verification failed".to_string(),
            ));
        }

        // One-shot transition; a lost race means someone else settled it.
        let settled = Order::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid),
            )
            .col_expr(
                order::Column::GatewayPaymentId,
                Expr::value(input.gateway_payment_id.clone()),
            )
            .col_expr(
                order::Column::GatewaySignature,
                Expr::value(input.gateway_signature.clone()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order.id))
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Created))
            .exec(&*self.db)
            .await?;

        if settled.rows_affected == 0 {
            let current = Order::find_by_id(order.id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
            return match current.payment_status {
                PaymentStatus::Paid => Ok(current),
                _ => Err(ServiceError::PaymentVerification(
                    "Payment verification failed".to_string(),
                )),
            };
        }

        // Consume the coupon only after payment is settled; the redeemed flag
        // keeps one order from redeeming twice.
        if let Some(code) = &order.coupon_code {
            if !order.coupon_redeemed {
                if self.coupons.redeem(code, order.user_id).await? == RedemptionOutcome::Applied {
                    Order::update_many()
                        .col_expr(order::Column::CouponRedeemed, Expr::value(true))
                        .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(order::Column::Id.eq(order.id))
                        .filter(order::Column::CouponRedeemed.eq(false))
                        .exec(&*self.db)
                        .await?;
                }
            }
        }

        let settled_order = Order::find_by_id(order.id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        info!(order_id = %order.id, "payment verified");
        Ok(settled_order)
    }
}

/// Address completeness plus the location-mode rules: `current` needs
/// numeric coordinates and a maps link, an explicit `manual` needs the
/// free-text location.
fn validate_address(address: &DeliveryAddress) -> Result<(), ServiceError> {
    let required = [
        &address.full_name,
        &address.phone,
        &address.line1,
        &address.city,
        &address.state,
        &address.pincode,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(ServiceError::ValidationError(
            "Address is incomplete".to_string(),
        ));
    }

    match address.location_mode {
        Some(LocationMode::Current) => {
            if address.lat.is_none() || address.lng.is_none() || address.maps_url.trim().is_empty()
            {
                return Err(ServiceError::ValidationError(
                    "Location is incomplete".to_string(),
                ));
            }
        }
        Some(LocationMode::Manual) => {
            if address.location_text.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Location is incomplete".to_string(),
                ));
            }
        }
        None => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            full_name: "A Customer".into(),
            phone: "9999999999".into(),
            line1: "12 High Street".into(),
            line2: None,
            city: "Pune".into(),
            state: "MH".into(),
            pincode: "411001".into(),
            location_mode: None,
            location_text: String::new(),
            lat: None,
            lng: None,
            maps_url: String::new(),
        }
    }

    #[test]
    fn accepts_a_complete_address() {
        assert!(validate_address(&address()).is_ok());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let mut a = address();
        a.pincode = "  ".into();
        assert!(validate_address(&a).is_err());
    }

    #[test]
    fn current_location_requires_coordinates_and_link() {
        let mut a = address();
        a.location_mode = Some(LocationMode::Current);
        a.lat = Some(18.52);
        a.lng = Some(73.85);
        assert!(validate_address(&a).is_err());

        a.maps_url = "https://maps.example/?q=18.52,73.85".into();
        assert!(validate_address(&a).is_ok());
    }

    #[test]
    fn explicit_manual_mode_requires_location_text() {
        let mut a = address();
        a.location_mode = Some(LocationMode::Manual);
        assert!(validate_address(&a).is_err());

        a.location_text = "Opposite the park gate".into();
        assert!(validate_address(&a).is_ok());
    }
}
