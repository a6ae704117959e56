//! Status vocabularies and the delivery transition table
//!
//! 配送状态机的唯一事实来源。服务端的条件更新和客户端的按钮状态
//! 都从这张表读取合法转换。

use serde::{Deserialize, Serialize};

// ============================================================================
// Delivery Status
// ============================================================================

/// Delivery status of an order
///
/// Lifecycle: `Pending → Claimed → PickedUp → Delivered`, with `Cancelled`
/// reachable from every non-terminal state (admin action). `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Claimed,
    PickedUp,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Wire representation, identical to the serde form
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::Claimed => "Claimed",
            DeliveryStatus::PickedUp => "PickedUp",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
        }
    }

    /// 终态：不允许任何后续转换
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// The state a driver-advance to `target` must start from
    ///
    /// Returns `None` when `target` is not a driver-advanceable state
    /// (drivers may only move Claimed→PickedUp and PickedUp→Delivered).
    pub fn required_current_for(target: DeliveryStatus) -> Option<DeliveryStatus> {
        match target {
            DeliveryStatus::PickedUp => Some(DeliveryStatus::Claimed),
            DeliveryStatus::Delivered => Some(DeliveryStatus::PickedUp),
            _ => None,
        }
    }

    /// Whether `self → target` is a legal transition for a driver
    pub fn can_advance_to(&self, target: DeliveryStatus) -> bool {
        DeliveryStatus::required_current_for(target) == Some(*self)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(DeliveryStatus::Pending),
            "Claimed" => Ok(DeliveryStatus::Claimed),
            "PickedUp" => Ok(DeliveryStatus::PickedUp),
            "Delivered" => Ok(DeliveryStatus::Delivered),
            "Cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(format!("unknown delivery status: {}", other)),
        }
    }
}

// ============================================================================
// Payment
// ============================================================================

/// How an order is paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Online payment through the external gateway
    #[default]
    Gateway,
    /// Cash on delivery
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Cash => "cash",
        }
    }
}

/// Payment status
///
/// 只允许 unpaid→paid 或 unpaid→failed，永不回退。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Unpaid)
    }
}

// ============================================================================
// Dispute
// ============================================================================

/// Dispute workflow status
///
/// `None → Open → {UnderReview, ApprovedRefund, Rejected, Resolved}`.
/// Transitions after Open are admin-driven.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DisputeStatus {
    #[default]
    None,
    Open,
    UnderReview,
    ApprovedRefund,
    Rejected,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::None => "None",
            DisputeStatus::Open => "Open",
            DisputeStatus::UnderReview => "UnderReview",
            DisputeStatus::ApprovedRefund => "ApprovedRefund",
            DisputeStatus::Rejected => "Rejected",
            DisputeStatus::Resolved => "Resolved",
        }
    }

    /// Statuses an admin may move a dispute to
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            DisputeStatus::UnderReview
                | DisputeStatus::ApprovedRefund
                | DisputeStatus::Rejected
                | DisputeStatus::Resolved
        )
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(DisputeStatus::None),
            "Open" => Ok(DisputeStatus::Open),
            "UnderReview" => Ok(DisputeStatus::UnderReview),
            "ApprovedRefund" => Ok(DisputeStatus::ApprovedRefund),
            "Rejected" => Ok(DisputeStatus::Rejected),
            "Resolved" => Ok(DisputeStatus::Resolved),
            other => Err(format!("unknown dispute status: {}", other)),
        }
    }
}

// ============================================================================
// Notification projection
// ============================================================================

/// Status carried by the best-effort notification projection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unpicked,
    Claimed,
    Picked,
    Delivered,
    Cancelled,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unpicked => "unpicked",
            NotificationStatus::Claimed => "claimed",
            NotificationStatus::Picked => "picked",
            NotificationStatus::Delivered => "delivered",
            NotificationStatus::Cancelled => "cancelled",
        }
    }
}
