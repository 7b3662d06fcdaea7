//! Status and classification enums for admin entities.
//!
//! All of these are stored as `TEXT` columns so that exported rows stay
//! human-readable and fixture files can be imported without enum casts.
//! Each enum round-trips through its `snake_case` name.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted value does not name a variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `Display`, `FromStr` and TEXT-backed sqlx support for an enum
/// whose variants map one-to-one onto string names.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored/serialized name of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including admin user management and data import.
    SuperAdmin,
    /// Full access to store management features.
    Admin,
    /// Read-only access to store data.
    Viewer,
}

text_enum!(AdminRole, "admin role", {
    SuperAdmin => "super_admin",
    Admin => "admin",
    Viewer => "viewer",
});

impl AdminRole {
    /// Whether this role may create, update or delete records.
    #[must_use]
    pub const fn can_write(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

/// Catalog visibility of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

text_enum!(ProductStatus, "product status", {
    Draft => "draft",
    Active => "active",
    Archived => "archived",
});

/// Lifecycle of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Fulfilled,
    Cancelled,
    PartiallyRefunded,
    Refunded,
}

text_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Paid => "paid",
    Fulfilled => "fulfilled",
    Cancelled => "cancelled",
    PartiallyRefunded => "partially_refunded",
    Refunded => "refunded",
});

/// Lifecycle of a refund request.
///
/// ```text
/// pending -> approved -> processed
/// pending -> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Processed,
}

text_enum!(RefundStatus, "refund status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Processed => "processed",
});

impl RefundStatus {
    /// Whether a refund may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected) | (Self::Approved, Self::Processed)
        )
    }

    /// Whether the refund still counts against the order total.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// How a coupon discounts an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` is a percentage in (0, 100].
    Percentage,
    /// `value` is a currency amount subtracted from the order.
    FixedAmount,
    /// Waives shipping; `value` is ignored.
    FreeShipping,
}

text_enum!(CouponKind, "coupon kind", {
    Percentage => "percentage",
    FixedAmount => "fixed_amount",
    FreeShipping => "free_shipping",
});

/// Publication state of a CMS page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

text_enum!(PageStatus, "page status", {
    Draft => "draft",
    Published => "published",
});

/// Depth of a node in the product taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLevel {
    /// Top-level grouping; never has a parent.
    Department,
    /// Child of a department.
    Type,
    /// Child of a type; never has children.
    Subtype,
}

text_enum!(CategoryLevel, "category level", {
    Department => "department",
    Type => "type",
    Subtype => "subtype",
});

impl CategoryLevel {
    /// The level a direct child of this node must have.
    #[must_use]
    pub const fn child(&self) -> Option<Self> {
        match self {
            Self::Department => Some(Self::Type),
            Self::Type => Some(Self::Subtype),
            Self::Subtype => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_parse_and_display() {
        for role in AdminRole::ALL {
            let parsed: AdminRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, *role);
            assert_eq!(parsed.to_string(), role.as_str());
        }
        assert!("owner".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert!(AdminRole::SuperAdmin.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
    }

    #[test]
    fn test_refund_transitions() {
        use RefundStatus::{Approved, Pending, Processed, Rejected};

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Processed));

        assert!(!Pending.can_transition_to(Processed));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Processed.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn test_rejected_refund_is_not_outstanding() {
        assert!(RefundStatus::Pending.is_outstanding());
        assert!(RefundStatus::Processed.is_outstanding());
        assert!(!RefundStatus::Rejected.is_outstanding());
    }

    #[test]
    fn test_category_level_children() {
        assert_eq!(CategoryLevel::Department.child(), Some(CategoryLevel::Type));
        assert_eq!(CategoryLevel::Type.child(), Some(CategoryLevel::Subtype));
        assert_eq!(CategoryLevel::Subtype.child(), None);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PartiallyRefunded).unwrap();
        assert_eq!(json, "\"partially_refunded\"");
        let kind: CouponKind = serde_json::from_str("\"fixed_amount\"").unwrap();
        assert_eq!(kind, CouponKind::FixedAmount);
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "shipped".parse::<PageStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid page status: shipped");
    }
}
