//! Coupon rules: draft validation and discount evaluation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{CouponKind, round_money};

use crate::models::{Coupon, CouponDraft};

/// Coupon fields as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponInput {
    pub code: String,
    pub description: Option<String>,
    pub kind: CouponKind,
    #[serde(default)]
    pub value: Decimal,
    pub min_order_total: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl CouponInput {
    /// Normalize and validate into a draft.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn into_draft(self) -> Result<CouponDraft, String> {
        let code = normalize_code(&self.code);
        if code.is_empty() {
            return Err("Coupon code is required".to_owned());
        }
        if code.chars().any(char::is_whitespace) {
            return Err("Coupon code cannot contain spaces".to_owned());
        }

        match self.kind {
            CouponKind::Percentage if self.value <= Decimal::ZERO || self.value > Decimal::ONE_HUNDRED => {
                return Err("Percentage value must be greater than 0 and at most 100".to_owned());
            }
            CouponKind::FixedAmount if self.value <= Decimal::ZERO => {
                return Err("Fixed amount must be greater than 0".to_owned());
            }
            _ => {}
        }

        if self.min_order_total.is_some_and(|m| m < Decimal::ZERO) {
            return Err("Minimum order total cannot be negative".to_owned());
        }
        if self.usage_limit.is_some_and(|l| l < 1) {
            return Err("Usage limit must be at least 1".to_owned());
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at)
            && ends <= starts
        {
            return Err("End date must be after start date".to_owned());
        }

        let value = match self.kind {
            CouponKind::FreeShipping => Decimal::ZERO,
            _ => self.value,
        };

        Ok(CouponDraft {
            code,
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            kind: self.kind,
            value,
            min_order_total: self.min_order_total,
            usage_limit: self.usage_limit,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            active: self.active,
        })
    }
}

/// Canonical form of a coupon code: trimmed, uppercase.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Outcome of checking a coupon against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponCheck {
    pub code: String,
    pub valid: bool,
    /// Amount taken off the order total.
    pub discount: Decimal,
    pub free_shipping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CouponCheck {
    fn rejected(coupon: &Coupon, reason: impl Into<String>) -> Self {
        Self {
            code: coupon.code.clone(),
            valid: false,
            discount: Decimal::ZERO,
            free_shipping: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check whether `coupon` applies to an order of `order_total` at `now`.
#[must_use]
pub fn evaluate(coupon: &Coupon, order_total: Decimal, now: DateTime<Utc>) -> CouponCheck {
    if !coupon.active {
        return CouponCheck::rejected(coupon, "Coupon is not active");
    }
    if coupon.starts_at.is_some_and(|s| now < s) {
        return CouponCheck::rejected(coupon, "Coupon is not yet valid");
    }
    if coupon.ends_at.is_some_and(|e| now >= e) {
        return CouponCheck::rejected(coupon, "Coupon has expired");
    }
    if coupon.usage_limit.is_some_and(|limit| coupon.times_used >= limit) {
        return CouponCheck::rejected(coupon, "Coupon usage limit reached");
    }
    if let Some(min) = coupon.min_order_total
        && order_total < min
    {
        return CouponCheck::rejected(coupon, format!("Order total must be at least {min}"));
    }

    let order_total = order_total.max(Decimal::ZERO);
    let discount = match coupon.kind {
        CouponKind::Percentage => round_money(order_total * coupon.value / Decimal::ONE_HUNDRED),
        CouponKind::FixedAmount => coupon.value,
        CouponKind::FreeShipping => Decimal::ZERO,
    };

    CouponCheck {
        code: coupon.code.clone(),
        valid: true,
        discount: discount.min(order_total),
        free_shipping: coupon.kind == CouponKind::FreeShipping,
        reason: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use emporium_core::CouponId;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn input(kind: CouponKind, value: &str) -> CouponInput {
        CouponInput {
            code: " summer10 ".to_owned(),
            description: Some("  ".to_owned()),
            kind,
            value: value.parse().unwrap(),
            min_order_total: None,
            usage_limit: None,
            starts_at: None,
            ends_at: None,
            active: true,
        }
    }

    fn coupon(kind: CouponKind, value: &str) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "SUMMER10".to_owned(),
            description: None,
            kind,
            value: value.parse().unwrap(),
            min_order_total: None,
            usage_limit: None,
            times_used: 0,
            starts_at: None,
            ends_at: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_draft_normalizes_code() {
        let draft = input(CouponKind::Percentage, "10").into_draft().unwrap();
        assert_eq!(draft.code, "SUMMER10");
        assert_eq!(draft.description, None);
    }

    #[test]
    fn test_draft_value_rules() {
        assert!(input(CouponKind::Percentage, "0").into_draft().is_err());
        assert!(input(CouponKind::Percentage, "100.01").into_draft().is_err());
        assert!(input(CouponKind::Percentage, "100").into_draft().is_ok());
        assert!(input(CouponKind::FixedAmount, "0").into_draft().is_err());
        assert!(input(CouponKind::FixedAmount, "5").into_draft().is_ok());

        let free = input(CouponKind::FreeShipping, "12").into_draft().unwrap();
        assert_eq!(free.value, Decimal::ZERO);
    }

    #[test]
    fn test_draft_rejects_inverted_window() {
        let now = Utc::now();
        let mut bad = input(CouponKind::FixedAmount, "5");
        bad.starts_at = Some(now);
        bad.ends_at = Some(now - Duration::days(1));
        assert_eq!(
            bad.into_draft().unwrap_err(),
            "End date must be after start date"
        );
    }

    #[test]
    fn test_evaluate_percentage_and_fixed() {
        let now = Utc::now();
        let check = evaluate(&coupon(CouponKind::Percentage, "15"), dec("80.00"), now);
        assert!(check.valid);
        assert_eq!(check.discount, dec("12.00"));

        let check = evaluate(&coupon(CouponKind::FixedAmount, "25"), dec("20.00"), now);
        assert_eq!(check.discount, dec("20.00"));

        let check = evaluate(&coupon(CouponKind::FreeShipping, "0"), dec("20.00"), now);
        assert!(check.free_shipping);
        assert_eq!(check.discount, Decimal::ZERO);
    }

    #[test]
    fn test_evaluate_rejections() {
        let now = Utc::now();

        let mut inactive = coupon(CouponKind::FixedAmount, "5");
        inactive.active = false;
        assert_eq!(
            evaluate(&inactive, dec("50"), now).reason.as_deref(),
            Some("Coupon is not active")
        );

        let mut expired = coupon(CouponKind::FixedAmount, "5");
        expired.ends_at = Some(now - Duration::hours(1));
        assert!(!evaluate(&expired, dec("50"), now).valid);

        let mut future = coupon(CouponKind::FixedAmount, "5");
        future.starts_at = Some(now + Duration::hours(1));
        assert!(!evaluate(&future, dec("50"), now).valid);

        let mut used_up = coupon(CouponKind::FixedAmount, "5");
        used_up.usage_limit = Some(3);
        used_up.times_used = 3;
        assert_eq!(
            evaluate(&used_up, dec("50"), now).reason.as_deref(),
            Some("Coupon usage limit reached")
        );

        let mut minimum = coupon(CouponKind::FixedAmount, "5");
        minimum.min_order_total = Some(dec("100"));
        let check = evaluate(&minimum, dec("99.99"), now);
        assert!(!check.valid);
        assert_eq!(check.reason.as_deref(), Some("Order total must be at least 100"));
    }
}
