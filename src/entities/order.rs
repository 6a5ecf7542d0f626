use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted checkout attempt and its payment lifecycle.
///
/// Line items live in [`super::order_item`]; both are immutable after
/// creation except for the payment block and the coupon `redeemed` flag.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    // Totals, whole currency units
    pub subtotal: i64,
    pub discount: i64,
    pub payable: i64,
    pub total_protein: i64,
    pub total_calories: i64,

    // Coupon snapshot; redeemed flips true exactly once, after payment
    #[sea_orm(nullable)]
    pub coupon_code: Option<String>,
    pub coupon_discount: i64,
    pub coupon_redeemed: bool,

    // Delivery address snapshot
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[sea_orm(nullable)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub location_mode: LocationMode,
    pub location_text: String,
    #[sea_orm(nullable)]
    pub lat: Option<f64>,
    #[sea_orm(nullable)]
    pub lng: Option<f64>,
    pub maps_url: String,

    // Delivery slot, "YYYY-MM-DD" / "HH:00"
    pub slot_date: String,
    pub slot_time: String,

    pub payment_provider: String,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: String,
    #[sea_orm(nullable)]
    pub gateway_payment_id: Option<String>,
    #[sea_orm(nullable)]
    pub gateway_signature: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payment lifecycle: `created` before the gateway round-trip, then exactly
/// one transition to `paid` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// How the delivery location was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "current")]
    Current,
}
