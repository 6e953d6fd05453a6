// ABOUTME: Loyalty award pipeline: base points by source, tier multiplier, balance update, tier check
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, Duration, Utc};
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use uuid::Uuid;

use crate::errors::AppResult;

/// Loyalty configuration, read once per award call (or cached by the caller).
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LoyaltyConfig {
    /// Whether the program is enabled at all; disabled means every award is a no-op.
    pub enabled: bool,
    /// Days after which an earned point expires.
    pub point_expiry_days: i32,
    /// Base points awarded for a `visit` source event.
    pub base_points_visit: f64,
    /// Base points per purchase currency unit for a `purchase` source event.
    pub base_points_purchase_unit: f64,
}

/// A tier definition: the minimum lifetime points to qualify, and its point multiplier.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoyaltyTier {
    /// Tier id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Minimum `total_earned` to hold this tier.
    pub min_points: f64,
    /// Multiplier applied to base points while in this tier.
    pub multiplier: f64,
}

/// Source of a loyalty award, determining which base-points config field applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardSource {
    /// An attendance check-in.
    Visit,
    /// A product or service purchase; `units` carries the currency amount.
    Purchase,
    /// A manually granted award (e.g. a referral bonus); base points supplied directly.
    Manual,
}

impl AwardSource {
    /// The string recorded in `loyalty_transactions.source`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Purchase => "purchase",
            Self::Manual => "manual",
        }
    }
}

/// Compute the effective points for one award: `round(base * tier_multiplier)`.
///
/// For [`AwardSource::Purchase`], `base` is `units * base_points_purchase_unit`, and
/// since that base is itself a product of two floats, rounding happens once, at the
/// very end, after the tier multiplier is applied — never at the per-unit step. This
/// resolves the boundary-rounding open question in favor of "round once, at the edge".
#[must_use]
pub fn effective_points(base: f64, tier_multiplier: f64) -> i64 {
    (base * tier_multiplier).round() as i64
}

/// Find the highest tier whose `min_points` does not exceed `total_earned`.
#[must_use]
pub fn applicable_tier(tiers: &[LoyaltyTier], total_earned: f64) -> Option<&LoyaltyTier> {
    tiers
        .iter()
        .filter(|t| t.min_points <= total_earned)
        .max_by(|a, b| a.min_points.total_cmp(&b.min_points))
}

/// Award loyalty points to `user_id` for `source`, updating balance and tier.
///
/// # Errors
/// Propagates database errors. Callers in the attendance pipeline should catch and log
/// errors from this function rather than letting them abort the primary write.
pub async fn award_points(
    conn: &mut PoolConnection<Postgres>,
    user_id: Uuid,
    source: AwardSource,
    reference: Option<&str>,
    purchase_units: Option<f64>,
) -> AppResult<Option<i64>> {
    let config: Option<LoyaltyConfig> = sqlx::query_as(
        "SELECT enabled, point_expiry_days, base_points_visit, base_points_purchase_unit FROM loyalty_config WHERE id = 1",
    )
    .fetch_optional(&mut **conn)
    .await?;
    let Some(config) = config else {
        return Ok(None);
    };
    if !config.enabled {
        return Ok(None);
    }

    let base = match source {
        AwardSource::Visit => config.base_points_visit,
        AwardSource::Purchase => purchase_units.unwrap_or(0.0) * config.base_points_purchase_unit,
        AwardSource::Manual => purchase_units.unwrap_or(0.0),
    };

    let existing: Option<(f64, f64, f64, f64, Option<Uuid>)> = sqlx::query_as(
        "SELECT total_earned, total_redeemed, total_expired, current_balance, tier_id FROM loyalty_points WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut **conn)
    .await?;
    let (total_earned, current_balance, tier_id) = match existing {
        Some((earned, _, _, balance, tier)) => (earned, balance, tier),
        None => (0.0, 0.0, None),
    };

    let tiers: Vec<LoyaltyTier> = sqlx::query_as("SELECT id, name, min_points, multiplier FROM loyalty_tiers ORDER BY min_points")
        .fetch_all(&mut **conn)
        .await?;
    let multiplier = tier_id
        .and_then(|id| tiers.iter().find(|t| t.id == id))
        .map_or(1.0, |t| t.multiplier);

    let points = effective_points(base, multiplier);
    let new_earned = total_earned + points as f64;
    let new_balance = current_balance + points as f64;
    let expires_at: DateTime<Utc> = Utc::now() + Duration::days(i64::from(config.point_expiry_days));

    sqlx::query(
        "INSERT INTO loyalty_points (user_id, total_earned, current_balance)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id) DO UPDATE SET total_earned = $2, current_balance = $3",
    )
    .bind(user_id)
    .bind(new_earned)
    .bind(new_balance)
    .execute(&mut **conn)
    .await?;

    sqlx::query(
        "INSERT INTO loyalty_transactions (id, user_id, transaction_type, points, balance_after, source, reference, expires_at)
         VALUES ($1, $2, 'earn', $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(points as f64)
    .bind(new_balance)
    .bind(source.as_str())
    .bind(reference)
    .bind(expires_at)
    .execute(&mut **conn)
    .await?;

    check_and_update_tier(conn, user_id, &tiers, new_earned, tier_id).await?;

    Ok(Some(points))
}

/// Reassert the correct tier for a user given their current `total_earned`, updating
/// `tier_id`/`tier_updated_at` only if the applicable tier changed.
///
/// # Errors
/// Propagates database errors.
pub async fn check_and_update_tier(
    conn: &mut PoolConnection<Postgres>,
    user_id: Uuid,
    tiers: &[LoyaltyTier],
    total_earned: f64,
    current_tier_id: Option<Uuid>,
) -> AppResult<()> {
    let Some(tier) = applicable_tier(tiers, total_earned) else {
        return Ok(());
    };
    if current_tier_id == Some(tier.id) {
        return Ok(());
    }
    sqlx::query("UPDATE loyalty_points SET tier_id = $1, tier_updated_at = now() WHERE user_id = $2")
        .bind(tier.id)
        .bind(user_id)
        .execute(&mut **conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_points_rounds_to_nearest() {
        assert_eq!(effective_points(10.0, 1.25), 13);
        assert_eq!(effective_points(10.0, 1.0), 10);
    }

    #[test]
    fn applicable_tier_picks_highest_qualifying() {
        let tiers = vec![
            LoyaltyTier { id: Uuid::new_v4(), name: "Bronze".into(), min_points: 0.0, multiplier: 1.0 },
            LoyaltyTier { id: Uuid::new_v4(), name: "Silver".into(), min_points: 500.0, multiplier: 1.25 },
            LoyaltyTier { id: Uuid::new_v4(), name: "Gold".into(), min_points: 2000.0, multiplier: 1.5 },
        ];
        let tier = applicable_tier(&tiers, 600.0).expect("should find a tier");
        assert_eq!(tier.name, "Silver");
    }

    #[test]
    fn applicable_tier_none_when_below_lowest() {
        let tiers = vec![LoyaltyTier { id: Uuid::new_v4(), name: "Bronze".into(), min_points: 10.0, multiplier: 1.0 }];
        assert!(applicable_tier(&tiers, 5.0).is_none());
    }
}
