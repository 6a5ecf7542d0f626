//! Coupon ledger integration tests: per-user and global limits under
//! sequential and concurrent redemption.

mod common;

use assert_matches::assert_matches;
use common::{seed_flat_coupon, test_db};
use mealbox_api::{
    entities::{coupon, coupon_redemption, Coupon, CouponRedemption},
    errors::ServiceError,
    services::coupons::{CouponService, RedemptionOutcome},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

#[tokio::test]
async fn redemption_is_recorded_once_per_user_limit() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    let coupon = seed_flat_coupon(&service, "ONCE", 50, 0, 0, 1).await;
    let user = Uuid::new_v4();

    assert_eq!(
        service.redeem("ONCE", user).await.unwrap(),
        RedemptionOutcome::Applied
    );
    assert_eq!(
        service.redeem("ONCE", user).await.unwrap(),
        RedemptionOutcome::Skipped
    );

    let stored = Coupon::find_by_id(coupon.id).one(&*db).await.unwrap().unwrap();
    assert_eq!(stored.used_count, 1);

    let row = CouponRedemption::find()
        .filter(coupon_redemption::Column::CouponId.eq(coupon.id))
        .filter(coupon_redemption::Column::UserId.eq(user))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemptions_never_exceed_the_total_limit() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    // Five users race for four uses
    let coupon = seed_flat_coupon(&service, "LIMIT4", 50, 0, 4, 1).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let service = service.clone();
        let user = Uuid::new_v4();
        handles.push(tokio::spawn(async move {
            service.redeem("LIMIT4", user).await.unwrap()
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() == RedemptionOutcome::Applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 4);

    let stored = Coupon::find_by_id(coupon.id).one(&*db).await.unwrap().unwrap();
    assert_eq!(stored.used_count, 4);
    // Exhausted coupons deactivate themselves
    assert!(!stored.is_active);
}

#[tokio::test]
async fn used_count_equals_the_sum_of_per_user_counts() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    let coupon = seed_flat_coupon(&service, "SUM", 10, 0, 0, 3).await;

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    for _ in 0..3 {
        assert_eq!(
            service.redeem("SUM", alice).await.unwrap(),
            RedemptionOutcome::Applied
        );
    }
    assert_eq!(
        service.redeem("SUM", bob).await.unwrap(),
        RedemptionOutcome::Applied
    );
    // Alice is out of uses
    assert_eq!(
        service.redeem("SUM", alice).await.unwrap(),
        RedemptionOutcome::Skipped
    );

    let stored = Coupon::find_by_id(coupon.id).one(&*db).await.unwrap().unwrap();
    let rows = CouponRedemption::find()
        .filter(coupon_redemption::Column::CouponId.eq(coupon.id))
        .all(&*db)
        .await
        .unwrap();
    let per_user_sum: i64 = rows.iter().map(|r| r.count).sum();

    assert_eq!(stored.used_count, 4);
    assert_eq!(stored.used_count, per_user_sum);
}

#[tokio::test]
async fn apply_rejects_a_coupon_the_user_already_redeemed() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    seed_flat_coupon(&service, "WELCOME", 100, 300, 0, 1).await;
    let user = Uuid::new_v4();

    let quote = service.apply(user, "WELCOME", 500).await.unwrap();
    assert_eq!(quote.discount, 100);

    service.redeem("WELCOME", user).await.unwrap();

    let err = service.apply(user, "WELCOME", 500).await.unwrap_err();
    assert_matches!(err, ServiceError::IneligibleCoupon(msg) if msg == "You already used this coupon");
}

#[tokio::test]
async fn apply_hides_unknown_and_inactive_codes_identically() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    let coupon = seed_flat_coupon(&service, "HIDDEN", 10, 0, 0, 1).await;
    service.toggle(coupon.id).await.unwrap();
    let user = Uuid::new_v4();

    let unknown = service.apply(user, "NO-SUCH-CODE", 500).await.unwrap_err();
    let inactive = service.apply(user, "HIDDEN", 500).await.unwrap_err();

    assert_matches!(unknown, ServiceError::IneligibleCoupon(msg) if msg == "Invalid coupon");
    assert_matches!(inactive, ServiceError::IneligibleCoupon(msg) if msg == "Invalid coupon");
}

#[tokio::test]
async fn apply_enforces_the_minimum_cart_total() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    seed_flat_coupon(&service, "MIN300", 100, 300, 0, 1).await;

    let err = service
        .apply(Uuid::new_v4(), "MIN300", 200)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::IneligibleCoupon(msg) if msg == "Minimum cart total 300");
}

#[tokio::test]
async fn available_coupons_exclude_ineligible_ones() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    seed_flat_coupon(&service, "OPEN", 50, 0, 0, 1).await;
    seed_flat_coupon(&service, "BIGCART", 50, 1000, 0, 1).await;
    let used = seed_flat_coupon(&service, "USED", 50, 0, 0, 1).await;

    let user = Uuid::new_v4();
    service.redeem("USED", user).await.unwrap();
    // Redeeming does not deactivate an unlimited coupon
    assert!(Coupon::find_by_id(used.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap()
        .is_active);

    let available = service.available_for(user, 500).await.unwrap();
    let codes: Vec<&str> = available.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["OPEN"]);
}

#[tokio::test]
async fn duplicate_codes_conflict() {
    let db = test_db().await;
    let service = CouponService::new(db.clone());
    seed_flat_coupon(&service, "DUP", 10, 0, 0, 1).await;

    let err = service
        .create(mealbox_api::services::coupons::CouponDraft {
            code: "dup".to_string(),
            kind: Some(coupon::CouponKind::Flat),
            value: Some(20),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Conflict(_));
}
