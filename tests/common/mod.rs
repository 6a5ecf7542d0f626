//! Shared fixtures: in-memory SQLite through the real migrator, a stub
//! payment gateway, and seed helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Local, Utc};
use mealbox_api::{
    entities::{coupon::CouponKind, meal},
    gateway::{GatewayError, GatewayOrder, PaymentGateway},
    migrator::Migrator,
    services::{
        checkout::{CartLine, CheckoutService, CreateOrderInput, DeliveryAddress, DeliverySlot},
        coupons::{CouponDraft, CouponService},
        delivery_slot::SlotPolicy,
    },
};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use uuid::Uuid;

pub const TEST_GATEWAY_SECRET: &str = "test_gateway_secret";
pub const TEST_GATEWAY_KEY_ID: &str = "rzp_test_key";

/// Fresh in-memory database with the full schema applied. A single
/// connection keeps SQLite writes serialized.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("sqlite connects");
    Migrator::up(&db, None).await.expect("migrations apply");
    Arc::new(db)
}

/// Gateway stub that hands out sequential order ids.
pub struct StubGateway {
    counter: AtomicU64,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            id: format!("order_stub_{n}"),
            amount: amount_minor,
            currency: currency.to_string(),
        })
    }

    fn key_id(&self) -> &str {
        TEST_GATEWAY_KEY_ID
    }
}

/// Gateway stub that always fails, as an unreachable provider would.
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn create_order(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        Err(GatewayError::Rejected {
            status: 503,
            body: "upstream down".to_string(),
        })
    }

    fn key_id(&self) -> &str {
        TEST_GATEWAY_KEY_ID
    }
}

pub fn checkout_service(
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
) -> CheckoutService {
    CheckoutService::new(
        db.clone(),
        Arc::new(CouponService::new(db)),
        gateway,
        SlotPolicy::default(),
        "INR".to_string(),
        TEST_GATEWAY_SECRET.to_string(),
    )
}

pub async fn seed_meal(
    db: &DatabaseConnection,
    title: &str,
    price: i64,
    protein: i64,
    calories: i64,
) -> meal::Model {
    let now = Utc::now();
    meal::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(String::new()),
        image_url: Set(format!("https://img.example/{title}.jpg")),
        protein: Set(protein),
        calories: Set(calories),
        price: Set(price),
        is_featured: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("meal inserts")
}

/// Flat coupon with the given limits, via the admin path.
pub async fn seed_flat_coupon(
    coupons: &CouponService,
    code: &str,
    value: i64,
    min_cart_total: i64,
    usage_limit_total: i64,
    usage_limit_per_user: i64,
) -> mealbox_api::entities::coupon::Model {
    coupons
        .create(CouponDraft {
            code: code.to_string(),
            kind: Some(CouponKind::Flat),
            value: Some(value),
            min_cart_total: Some(min_cart_total),
            usage_limit_total: Some(usage_limit_total),
            usage_limit_per_user: Some(usage_limit_per_user),
            ..Default::default()
        })
        .await
        .expect("coupon creates")
}

pub fn delivery_address() -> DeliveryAddress {
    DeliveryAddress {
        full_name: "Test Customer".to_string(),
        phone: "9999999999".to_string(),
        line1: "12 High Street".to_string(),
        line2: None,
        city: "Pune".to_string(),
        state: "MH".to_string(),
        pincode: "411001".to_string(),
        location_mode: None,
        location_text: String::new(),
        lat: None,
        lng: None,
        maps_url: String::new(),
    }
}

/// Noon, two days out: always inside the window and past the lead time.
pub fn valid_slot() -> DeliverySlot {
    DeliverySlot {
        date: (Local::now() + Duration::days(2))
            .format("%Y-%m-%d")
            .to_string(),
        time: "12:00".to_string(),
    }
}

pub fn order_input(lines: Vec<(Uuid, i64)>, coupon_code: Option<&str>) -> CreateOrderInput {
    CreateOrderInput {
        items: lines
            .into_iter()
            .map(|(meal_id, quantity)| CartLine { meal_id, quantity })
            .collect(),
        address: delivery_address(),
        delivery_slot: valid_slot(),
        coupon_code: coupon_code.map(str::to_string),
    }
}
