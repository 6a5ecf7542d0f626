//! Coupon eligibility checks and the redemption ledger.
//!
//! Eligibility is read-only and reused by preview, listing, and checkout.
//! Redemption advances `used_count` and the per-user counter with
//! conditional updates inside one transaction, so concurrent redemptions can
//! never push usage past a limit.

use crate::{
    entities::{
        coupon::{self, CouponKind},
        coupon_redemption, Coupon, CouponRedemption,
    },
    errors::ServiceError,
    services::pricing,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Successful preview of a coupon against a cart value.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CouponQuote {
    pub code: String,
    pub discount: i64,
}

/// Result of a redemption attempt for a paid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// Usage was recorded; the order may mark its coupon redeemed.
    Applied,
    /// The coupon vanished or a limit was hit between preview and payment;
    /// nothing was recorded.
    Skipped,
}

/// Fields accepted when an administrator creates or edits a coupon.
#[derive(Debug, Clone, Default)]
pub struct CouponDraft {
    pub code: String,
    pub kind: Option<CouponKind>,
    pub value: Option<i64>,
    pub min_cart_total: Option<i64>,
    pub max_discount: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit_total: Option<i64>,
    pub usage_limit_per_user: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<coupon::Model>, ServiceError> {
        let normalized = normalize_code(code);
        let found = Coupon::find()
            .filter(coupon::Column::Code.eq(normalized))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    /// Times the requesting user has already redeemed this coupon.
    async fn user_redemption_count(
        &self,
        coupon_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let row = CouponRedemption::find()
            .filter(coupon_redemption::Column::CouponId.eq(coupon_id))
            .filter(coupon_redemption::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Read-only eligibility check; returns the discount the coupon would
    /// grant. Used at preview time and again at order creation.
    #[instrument(skip(self, coupon), fields(code = %coupon.code))]
    pub async fn eligible_discount(
        &self,
        coupon: &coupon::Model,
        user_id: Uuid,
        subtotal: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, ServiceError> {
        let user_count = self.user_redemption_count(coupon.id, user_id).await?;

        if let Some(reason) = eligibility_failure(coupon, user_count, subtotal, now) {
            return Err(ServiceError::IneligibleCoupon(reason));
        }

        Ok(pricing::compute_discount(subtotal, coupon))
    }

    /// `POST /coupons/apply`: unknown and inactive codes are indistinguishable
    /// to the caller.
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        user_id: Uuid,
        code: &str,
        cart_total: i64,
    ) -> Result<CouponQuote, ServiceError> {
        let coupon = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::IneligibleCoupon("Invalid coupon".to_string()))?;

        let discount = self
            .eligible_discount(&coupon, user_id, cart_total, Utc::now())
            .await?;

        Ok(CouponQuote {
            code: coupon.code,
            discount,
        })
    }

    /// Coupons the caller could apply to a cart of `cart_total` right now.
    pub async fn available_for(
        &self,
        user_id: Uuid,
        cart_total: i64,
    ) -> Result<Vec<coupon::Model>, ServiceError> {
        let now = Utc::now();
        let coupons = Coupon::find()
            .filter(coupon::Column::IsActive.eq(true))
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let counts = CouponRedemption::find()
            .filter(coupon_redemption::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        let by_coupon: std::collections::HashMap<Uuid, i64> =
            counts.into_iter().map(|r| (r.coupon_id, r.count)).collect();

        Ok(coupons
            .into_iter()
            .filter(|c| {
                let used = by_coupon.get(&c.id).copied().unwrap_or(0);
                eligibility_failure(c, used, cart_total, now).is_none()
            })
            .collect())
    }

    /// Records one use of `code` by `user_id`, exactly once, limits
    /// permitting.
    ///
    /// The per-user and global counters are advanced by conditional updates
    /// inside a single transaction; if either condition no longer holds the
    /// transaction rolls back and nothing is recorded. The (coupon, user)
    /// row is seeded with an idempotent insert beforehand so the transaction
    /// itself never hits the unique index.
    #[instrument(skip(self))]
    pub async fn redeem(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<RedemptionOutcome, ServiceError> {
        let Some(coupon) = self.find_by_code(code).await? else {
            warn!(code, "coupon missing at redemption time");
            return Ok(RedemptionOutcome::Skipped);
        };
        let now = Utc::now();

        // Seed the per-user row; racing first uses collapse onto one row.
        let seed = coupon_redemption::ActiveModel {
            id: Set(Uuid::new_v4()),
            coupon_id: Set(coupon.id),
            user_id: Set(user_id),
            count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        match CouponRedemption::insert(seed)
            .on_conflict(
                OnConflict::columns([
                    coupon_redemption::Column::CouponId,
                    coupon_redemption::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&*self.db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(err) => return Err(err.into()),
        }

        let txn = self.db.begin().await?;

        let per_user = CouponRedemption::update_many()
            .col_expr(
                coupon_redemption::Column::Count,
                Expr::col(coupon_redemption::Column::Count).add(1),
            )
            .col_expr(coupon_redemption::Column::UpdatedAt, Expr::value(now))
            .filter(coupon_redemption::Column::CouponId.eq(coupon.id))
            .filter(coupon_redemption::Column::UserId.eq(user_id))
            .filter(coupon_redemption::Column::Count.lt(coupon.usage_limit_per_user))
            .exec(&txn)
            .await?;

        if per_user.rows_affected == 0 {
            txn.rollback().await?;
            warn!(code, %user_id, "per-user limit hit at redemption time");
            return Ok(RedemptionOutcome::Skipped);
        }

        let global = Coupon::update_many()
            .col_expr(
                coupon::Column::UsedCount,
                Expr::col(coupon::Column::UsedCount).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
            .filter(coupon::Column::Id.eq(coupon.id))
            .filter(coupon::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimitTotal.eq(0))
                    .add(
                        Expr::col(coupon::Column::UsedCount)
                            .lt(Expr::col(coupon::Column::UsageLimitTotal)),
                    ),
            )
            .exec(&txn)
            .await?;

        if global.rows_affected == 0 {
            txn.rollback().await?;
            warn!(code, "total usage limit hit at redemption time");
            return Ok(RedemptionOutcome::Skipped);
        }

        // Exhausted coupons switch themselves off.
        Coupon::update_many()
            .col_expr(coupon::Column::IsActive, Expr::value(false))
            .filter(coupon::Column::Id.eq(coupon.id))
            .filter(coupon::Column::UsageLimitTotal.gt(0))
            .filter(
                Expr::col(coupon::Column::UsedCount)
                    .gte(Expr::col(coupon::Column::UsageLimitTotal)),
            )
            .exec(&txn)
            .await?;

        txn.commit().await?;
        debug!(code, %user_id, "coupon redemption recorded");
        Ok(RedemptionOutcome::Applied)
    }

    // ----- admin operations -----

    pub async fn create(&self, draft: CouponDraft) -> Result<coupon::Model, ServiceError> {
        let code = normalize_code(&draft.code);
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Coupon code required".to_string(),
            ));
        }
        let kind = draft
            .kind
            .ok_or_else(|| ServiceError::ValidationError("Coupon type required".to_string()))?;
        let value = draft
            .value
            .ok_or_else(|| ServiceError::ValidationError("Coupon value required".to_string()))?;
        if value < 0 {
            return Err(ServiceError::ValidationError(
                "Coupon value must be non-negative".to_string(),
            ));
        }

        let now = Utc::now();
        let model = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            kind: Set(kind),
            value: Set(value),
            min_cart_total: Set(draft.min_cart_total.unwrap_or(0)),
            // Flat coupons have no percentage cap to apply
            max_discount: Set(match kind {
                CouponKind::Flat => 0,
                CouponKind::Percent => draft.max_discount.unwrap_or(0),
            }),
            valid_from: Set(draft.valid_from),
            valid_to: Set(draft.valid_to),
            expires_at: Set(draft.expires_at),
            is_active: Set(draft.is_active.unwrap_or(true)),
            usage_limit_total: Set(draft.usage_limit_total.unwrap_or(0)),
            usage_limit_per_user: Set(draft.usage_limit_per_user.unwrap_or(1)),
            used_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(&*self.db).await.map_err(map_duplicate_code)
    }

    pub async fn list(&self) -> Result<Vec<coupon::Model>, ServiceError> {
        let coupons = Coupon::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(coupons)
    }

    pub async fn get(&self, id: Uuid) -> Result<coupon::Model, ServiceError> {
        Coupon::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Coupon not found".to_string()))
    }

    pub async fn toggle(&self, id: Uuid) -> Result<coupon::Model, ServiceError> {
        let existing = self.get(id).await?;
        let was_active = existing.is_active;

        let mut active: coupon::ActiveModel = existing.into();
        active.is_active = Set(!was_active);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        draft: CouponDraft,
    ) -> Result<coupon::Model, ServiceError> {
        let existing = self.get(id).await?;
        let kind = draft.kind.unwrap_or(existing.kind);
        let max_discount = match kind {
            CouponKind::Flat => 0,
            CouponKind::Percent => draft.max_discount.unwrap_or(existing.max_discount),
        };

        let mut active: coupon::ActiveModel = existing.into();
        if !draft.code.is_empty() {
            active.code = Set(normalize_code(&draft.code));
        }
        active.kind = Set(kind);
        if let Some(value) = draft.value {
            active.value = Set(value);
        }
        if let Some(min) = draft.min_cart_total {
            active.min_cart_total = Set(min);
        }
        active.max_discount = Set(max_discount);
        if draft.valid_from.is_some() {
            active.valid_from = Set(draft.valid_from);
        }
        if draft.valid_to.is_some() {
            active.valid_to = Set(draft.valid_to);
        }
        if draft.expires_at.is_some() {
            active.expires_at = Set(draft.expires_at);
        }
        if let Some(limit) = draft.usage_limit_total {
            active.usage_limit_total = Set(limit);
        }
        if let Some(limit) = draft.usage_limit_per_user {
            active.usage_limit_per_user = Set(limit);
        }
        if let Some(is_active) = draft.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        active.update(&*self.db).await.map_err(map_duplicate_code)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Coupon::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }
}

/// Uppercased, trimmed coupon code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Validity window: `valid_from`/`valid_to` win, `valid_to` inclusive through
/// the end of its calendar day; `expires_at` is the legacy exact-instant
/// fallback.
pub fn resolve_validity(
    coupon: &coupon::Model,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let to = coupon
        .valid_to
        .map(end_of_day)
        .or(coupon.expires_at);
    (coupon.valid_from, to)
}

fn end_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .expect("end of day is a valid time")
        .and_utc()
}

/// Why a coupon cannot be used right now, if any reason applies.
///
/// Checks run in the order callers expect the messages: active flag,
/// validity window, minimum cart, total limit, per-user limit.
pub fn eligibility_failure(
    coupon: &coupon::Model,
    user_count: i64,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Option<String> {
    if !coupon.is_active {
        return Some("Invalid coupon".to_string());
    }

    let (from, to) = resolve_validity(coupon);
    if let Some(from) = from {
        if now < from {
            return Some("Coupon not active yet".to_string());
        }
    }
    if let Some(to) = to {
        if now > to {
            return Some("Coupon expired".to_string());
        }
    }

    if subtotal < coupon.min_cart_total {
        return Some(format!("Minimum cart total {}", coupon.min_cart_total));
    }

    if coupon.usage_limit_total > 0 && coupon.used_count >= coupon.usage_limit_total {
        return Some("Coupon usage limit reached".to_string());
    }

    if user_count >= coupon.usage_limit_per_user {
        return Some("You already used this coupon".to_string());
    }

    None
}

fn map_duplicate_code(err: DbErr) -> ServiceError {
    let text = err.to_string();
    if text.contains("UNIQUE constraint") || text.contains("duplicate key") {
        ServiceError::Conflict("Coupon code already exists".to_string())
    } else {
        ServiceError::DatabaseError(err)
    }
}
