pub mod admin_coupons;
pub mod checkout;
pub mod common;
pub mod coupons;
pub mod meals;
pub mod orders;

use crate::{
    auth::AuthService,
    config::AppConfig,
    gateway::PaymentGateway,
    services::{
        checkout::CheckoutService, coupons::CouponService, delivery_slot::SlotPolicy,
        meals::MealService, orders::OrderService,
    },
    AppState,
};
use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub checkout: Arc<CheckoutService>,
    pub coupons: Arc<CouponService>,
    pub meals: Arc<MealService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let coupons = Arc::new(CouponService::new(db.clone()));
        let gateway_secret = config
            .razorpay_key_secret
            .clone()
            .unwrap_or_default();

        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            coupons.clone(),
            gateway,
            SlotPolicy::from_config(config),
            config.currency.clone(),
            gateway_secret,
        ));

        Self {
            auth: Arc::new(AuthService::new(config.jwt_secret.clone())),
            checkout,
            coupons,
            meals: Arc::new(MealService::new(db.clone())),
            orders: Arc::new(OrderService::new(db)),
        }
    }
}

/// Full `/api` surface.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/checkout", checkout::checkout_routes())
        .nest("/coupons", coupons::coupon_routes())
        .nest("/admin/coupons", admin_coupons::admin_coupon_routes())
        .nest("/meals", meals::meal_routes())
        .nest("/orders", orders::order_routes())
}
