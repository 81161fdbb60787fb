//! Order record and its status graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

use crate::catalog::{PaymentMethod, ProductId};
use crate::i18n::Locale;

/// Identifier assigned by the store (`orders.id`, monotonically increasing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(OrderId)
    }
}

/// Where an order is in its lifecycle.
///
/// ```text
/// pending -> proof_received -> approved -> delivered
///                           \-> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    ProofReceived,
    Approved,
    Rejected,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::ProofReceived,
        OrderStatus::Approved,
        OrderStatus::Rejected,
        OrderStatus::Delivered,
    ];

    /// Whether `self -> next` is an edge of the status graph.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::ProofReceived)
                | (OrderStatus::ProofReceived, OrderStatus::Approved)
                | (OrderStatus::ProofReceived, OrderStatus::Rejected)
                | (OrderStatus::Approved, OrderStatus::Delivered)
        )
    }

    /// No operation changes a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Delivered)
    }

    /// Statuses whose buyers are told when the deferred release opens.
    pub fn qualifies_for_release(self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Delivered)
    }
}

/// A persisted purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: i64,
    pub buyer_handle: Option<String>,
    pub language: Locale,
    pub product: ProductId,
    pub payment_method: Option<PaymentMethod>,
    pub status: OrderStatus,
    pub is_deferred_cohort: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// `@handle` when known, otherwise a dash.
    pub fn handle_display(&self) -> String {
        match self.buyer_handle.as_deref() {
            Some(handle) if !handle.is_empty() => format!("@{}", handle),
            _ => "-".to_string(),
        }
    }
}

/// Input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub buyer_handle: Option<String>,
    pub language: Locale,
    pub product: ProductId,
    pub payment_method: Option<PaymentMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_documented_edges_are_allowed() {
        let allowed = [
            (OrderStatus::Pending, OrderStatus::ProofReceived),
            (OrderStatus::ProofReceived, OrderStatus::Approved),
            (OrderStatus::ProofReceived, OrderStatus::Rejected),
            (OrderStatus::Approved, OrderStatus::Delivered),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for from in OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(OrderStatus::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Approved.is_terminal());
    }

    #[test]
    fn status_text_matches_column_values() {
        assert_eq!(OrderStatus::ProofReceived.as_ref(), "proof_received");
        assert_eq!("approved".parse::<OrderStatus>().ok(), Some(OrderStatus::Approved));
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_id_accepts_hash_prefix() {
        assert_eq!("#42".parse::<OrderId>().ok(), Some(OrderId(42)));
        assert_eq!(" 7 ".parse::<OrderId>().ok(), Some(OrderId(7)));
        assert!("abc".parse::<OrderId>().is_err());
    }
}
