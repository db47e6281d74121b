//! Pure eligibility checks for the scheduled jobs.
//!
//! The store pre-filters candidates on static fields; these functions make the
//! exact call. Nothing here reads the clock or touches I/O.

use crate::models::{Direction, GradingOrder, GradingStatus, WatchRule};

/// A rule fires when it is still active and the price has crossed its target.
///
/// Non-finite or non-positive prices never trigger.
pub fn is_triggered(rule: &WatchRule, current_price: f64) -> bool {
    if !rule.active || !current_price.is_finite() || current_price <= 0.0 {
        return false;
    }

    match rule.direction {
        Direction::Below => current_price <= rule.target_price,
        Direction::Above => current_price >= rule.target_price,
    }
}

/// Unix second at which the order's countdown ends, if it has been paid.
pub fn expires_at(order: &GradingOrder) -> Option<i64> {
    order
        .paid_at
        .map(|paid| paid.saturating_add(order.speed_tier.delay_secs()))
}

pub fn is_expired(order: &GradingOrder, now: i64) -> bool {
    expires_at(order).is_some_and(|at| at <= now)
}

/// Seconds left on the countdown, clamped at zero. `None` for unpaid orders.
pub fn remaining(order: &GradingOrder, now: i64) -> Option<i64> {
    expires_at(order).map(|at| (at - now).max(0))
}

/// Expired and still waiting in the queue.
pub fn is_ready_for_grading(order: &GradingOrder, now: i64) -> bool {
    order.status == GradingStatus::Queued && is_expired(order, now)
}
