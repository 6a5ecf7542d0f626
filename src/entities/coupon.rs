use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discount coupon with global and per-user usage accounting.
///
/// `used_count` always equals the sum of the coupon's
/// [`super::coupon_redemption`] counts; both are only ever advanced together
/// inside the redemption transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Uppercase, unique
    #[sea_orm(unique)]
    pub code: String,

    pub kind: CouponKind,

    /// Flat currency amount or percentage, depending on `kind`
    pub value: i64,

    pub min_cart_total: i64,

    /// Percent coupons only; 0 = uncapped
    pub max_discount: i64,

    #[sea_orm(nullable)]
    pub valid_from: Option<DateTime<Utc>>,

    /// Inclusive through the end of that calendar day
    #[sea_orm(nullable)]
    pub valid_to: Option<DateTime<Utc>>,

    /// Legacy exact-instant expiry; consulted only when `valid_to` is absent
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    /// 0 = unlimited
    pub usage_limit_total: i64,

    pub usage_limit_per_user: i64,

    pub used_count: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coupon_redemption::Entity")]
    Redemptions,
}

impl Related<super::coupon_redemption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Redemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Discount shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    #[sea_orm(string_value = "flat")]
    Flat,
    #[sea_orm(string_value = "percent")]
    Percent,
}
