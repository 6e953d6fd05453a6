// ABOUTME: Engagement score pipeline: six weighted sub-scores, risk banding, churn alerts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use serde_json::json;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use uuid::Uuid;

use crate::errors::AppResult;

/// The six sub-scores feeding the overall engagement score, each in `[0, 100]`.
#[derive(Debug, Clone, Copy)]
pub struct EngagementInputs {
    /// How often the member visits relative to their plan's expected cadence.
    pub visit_frequency: f64,
    /// How recently the member last visited.
    pub visit_recency: f64,
    /// Direction of visit count over the trailing period.
    pub attendance_trend: f64,
    /// On-time payment history.
    pub payment_reliability: f64,
    /// How long the member has held a membership.
    pub membership_tenure: f64,
    /// Breadth of engagement beyond attendance (challenges, bookings, surveys).
    pub engagement_depth: f64,
}

/// Fixed weights combining the six sub-scores into one overall score. Sums to 1.0.
const WEIGHTS: EngagementInputs = EngagementInputs {
    visit_frequency: 0.25,
    visit_recency: 0.20,
    attendance_trend: 0.15,
    payment_reliability: 0.15,
    membership_tenure: 0.10,
    engagement_depth: 0.15,
};

/// Risk band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    /// `overall_score < 25`.
    Critical,
    /// `25 <= overall_score < 50`.
    High,
    /// `50 <= overall_score < 75`.
    Medium,
    /// `overall_score >= 75`.
    Low,
}

impl RiskLevel {
    /// Band `overall_score` into a [`RiskLevel`].
    #[must_use]
    pub fn from_score(overall_score: f64) -> Self {
        if overall_score >= 75.0 {
            Self::Low
        } else if overall_score >= 50.0 {
            Self::Medium
        } else if overall_score >= 25.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Database/display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether `self` is a worse band than `previous` (risk deteriorated).
    #[must_use]
    pub fn deteriorated_from(self, previous: Self) -> bool {
        self < previous
    }
}

/// Clamp a sub-score into `[0, 100]` and combine via fixed weights.
#[must_use]
pub fn overall_score(inputs: EngagementInputs) -> f64 {
    let clamp = |v: f64| v.clamp(0.0, 100.0);
    clamp(inputs.visit_frequency) * WEIGHTS.visit_frequency
        + clamp(inputs.visit_recency) * WEIGHTS.visit_recency
        + clamp(inputs.attendance_trend) * WEIGHTS.attendance_trend
        + clamp(inputs.payment_reliability) * WEIGHTS.payment_reliability
        + clamp(inputs.membership_tenure) * WEIGHTS.membership_tenure
        + clamp(inputs.engagement_depth) * WEIGHTS.engagement_depth
}

/// Recompute and persist the engagement score for one user: flips the prior `is_current`
/// row to `false`, inserts the new current row, and opens a churn alert if risk
/// deteriorated.
///
/// # Errors
/// Propagates database errors. Callers (the attendance pipeline, the scheduler) should
/// log and continue rather than letting a failure here abort the primary operation.
pub async fn recompute(
    conn: &mut PoolConnection<Postgres>,
    user_id: Uuid,
    inputs: EngagementInputs,
) -> AppResult<RiskLevel> {
    let score = overall_score(inputs);
    let risk = RiskLevel::from_score(score);

    let previous: Option<(String,)> =
        sqlx::query_as("SELECT risk_level FROM engagement_scores WHERE user_id = $1 AND is_current = true")
            .bind(user_id)
            .fetch_optional(&mut **conn)
            .await?;

    sqlx::query("UPDATE engagement_scores SET is_current = false WHERE user_id = $1 AND is_current = true")
        .bind(user_id)
        .execute(&mut **conn)
        .await?;

    sqlx::query(
        "INSERT INTO engagement_scores
            (id, user_id, visit_frequency, visit_recency, attendance_trend, payment_reliability,
             membership_tenure, engagement_depth, overall_score, risk_level, is_current)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, true)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(inputs.visit_frequency)
    .bind(inputs.visit_recency)
    .bind(inputs.attendance_trend)
    .bind(inputs.payment_reliability)
    .bind(inputs.membership_tenure)
    .bind(inputs.engagement_depth)
    .bind(score)
    .bind(risk.as_str())
    .execute(&mut **conn)
    .await?;

    if let Some((previous_level,)) = previous {
        if let Some(previous_risk) = parse_risk_level(&previous_level) {
            if risk.deteriorated_from(previous_risk) {
                open_churn_alert(conn, user_id, previous_risk, risk, inputs).await?;
            }
        }
    }

    Ok(risk)
}

async fn open_churn_alert(
    conn: &mut PoolConnection<Postgres>,
    user_id: Uuid,
    previous: RiskLevel,
    new: RiskLevel,
    inputs: EngagementInputs,
) -> AppResult<()> {
    let factors = json!({
        "visit_frequency": inputs.visit_frequency,
        "visit_recency": inputs.visit_recency,
        "attendance_trend": inputs.attendance_trend,
        "payment_reliability": inputs.payment_reliability,
        "membership_tenure": inputs.membership_tenure,
        "engagement_depth": inputs.engagement_depth,
    });
    let message = format!(
        "Engagement risk moved from {} to {}; review recent activity.",
        previous.as_str(),
        new.as_str()
    );
    sqlx::query(
        "INSERT INTO churn_alerts (id, user_id, previous_risk_level, new_risk_level, factors, message)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(previous.as_str())
    .bind(new.as_str())
    .bind(factors)
    .bind(message)
    .execute(&mut **conn)
    .await?;
    Ok(())
}

fn parse_risk_level(raw: &str) -> Option<RiskLevel> {
    match raw {
        "low" => Some(RiskLevel::Low),
        "medium" => Some(RiskLevel::Medium),
        "high" => Some(RiskLevel::High),
        "critical" => Some(RiskLevel::Critical),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_bands_match_thresholds() {
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(75.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(74.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(49.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(25.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(24.9), RiskLevel::Critical);
    }

    #[test]
    fn deterioration_detects_worsening_only() {
        assert!(RiskLevel::High.deteriorated_from(RiskLevel::Medium));
        assert!(!RiskLevel::Medium.deteriorated_from(RiskLevel::High));
        assert!(!RiskLevel::Medium.deteriorated_from(RiskLevel::Medium));
    }

    #[test]
    fn overall_score_clamps_out_of_range_inputs() {
        let inputs = EngagementInputs {
            visit_frequency: 150.0,
            visit_recency: -10.0,
            attendance_trend: 100.0,
            payment_reliability: 100.0,
            membership_tenure: 100.0,
            engagement_depth: 100.0,
        };
        let score = overall_score(inputs);
        assert!(score <= 100.0);
        assert!(score > 0.0);
    }
}
