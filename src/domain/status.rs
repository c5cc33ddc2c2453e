//! Workflow status machines with explicit transition tables.
//!
//! Statuses are stored as kebab-case strings; parsing back goes through
//! `FromStr` so an unknown value in the database surfaces as an error rather
//! than a silent default.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub trait Lifecycle: Copy + Eq + fmt::Debug + 'static {
    const NAME: &'static str;

    fn as_str(self) -> &'static str;
    fn parse(value: &str) -> Option<Self>;
    fn next(self) -> &'static [Self];

    /// The status whose first entry stamps the completion timestamp.
    fn completed() -> Self;
    fn cancelled() -> Self;

    fn can_transition_to(self, next: Self) -> bool {
        self.next().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.next().is_empty()
    }

    fn transition(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::BadRequest(format!(
                "{} cannot move from {} to {}",
                Self::NAME,
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

/// Parse a status string loaded from storage.
pub fn load<S: Lifecycle>(value: &str) -> AppResult<S> {
    S::parse(value).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("unknown {} status {value:?}", S::NAME))
    })
}

/// Parse a stored status and check that `to` is reachable from it.
pub fn check_transition<S: Lifecycle>(from: &str, to: S) -> AppResult<S> {
    load::<S>(from)?.transition(to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Refunded,
}

impl Lifecycle for OrderStatus {
    const NAME: &'static str = "order";

    fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProgress => "in-progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "pending" => OrderStatus::Pending,
            "confirmed" => OrderStatus::Confirmed,
            "in-progress" => OrderStatus::InProgress,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            "refunded" => OrderStatus::Refunded,
            _ => return None,
        })
    }

    fn next(self) -> &'static [Self] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed => &[Refunded],
            Cancelled | Refunded => &[],
        }
    }

    fn completed() -> Self {
        OrderStatus::Completed
    }

    fn cancelled() -> Self {
        OrderStatus::Cancelled
    }
}

/// Shared by logo and embroidery requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    InReview,
    InProgress,
    RevisionRequested,
    Completed,
    Cancelled,
}

impl Lifecycle for RequestStatus {
    const NAME: &'static str = "request";

    fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InReview => "in-review",
            RequestStatus::InProgress => "in-progress",
            RequestStatus::RevisionRequested => "revision-requested",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "pending" => RequestStatus::Pending,
            "in-review" => RequestStatus::InReview,
            "in-progress" => RequestStatus::InProgress,
            "revision-requested" => RequestStatus::RevisionRequested,
            "completed" => RequestStatus::Completed,
            "cancelled" => RequestStatus::Cancelled,
            _ => return None,
        })
    }

    fn next(self) -> &'static [Self] {
        use RequestStatus::*;
        match self {
            Pending => &[InReview, Cancelled],
            InReview => &[InProgress, RevisionRequested, Cancelled],
            InProgress => &[RevisionRequested, Completed, Cancelled],
            RevisionRequested => &[InProgress, Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    fn completed() -> Self {
        RequestStatus::Completed
    }

    fn cancelled() -> Self {
        RequestStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DesignStatus {
    Pending,
    InReview,
    DesignInProgress,
    RevisionRequested,
    Approved,
    InProduction,
    Shipped,
    Completed,
    Cancelled,
}

impl Lifecycle for DesignStatus {
    const NAME: &'static str = "design order";

    fn as_str(self) -> &'static str {
        match self {
            DesignStatus::Pending => "pending",
            DesignStatus::InReview => "in-review",
            DesignStatus::DesignInProgress => "design-in-progress",
            DesignStatus::RevisionRequested => "revision-requested",
            DesignStatus::Approved => "approved",
            DesignStatus::InProduction => "in-production",
            DesignStatus::Shipped => "shipped",
            DesignStatus::Completed => "completed",
            DesignStatus::Cancelled => "cancelled",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "pending" => DesignStatus::Pending,
            "in-review" => DesignStatus::InReview,
            "design-in-progress" => DesignStatus::DesignInProgress,
            "revision-requested" => DesignStatus::RevisionRequested,
            "approved" => DesignStatus::Approved,
            "in-production" => DesignStatus::InProduction,
            "shipped" => DesignStatus::Shipped,
            "completed" => DesignStatus::Completed,
            "cancelled" => DesignStatus::Cancelled,
            _ => return None,
        })
    }

    fn next(self) -> &'static [Self] {
        use DesignStatus::*;
        match self {
            Pending => &[InReview, Cancelled],
            InReview => &[DesignInProgress, Cancelled],
            DesignInProgress => &[RevisionRequested, Approved, Cancelled],
            RevisionRequested => &[DesignInProgress, Approved, Cancelled],
            Approved => &[InProduction, Cancelled],
            InProduction => &[Shipped],
            Shipped => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    fn completed() -> Self {
        DesignStatus::Completed
    }

    fn cancelled() -> Self {
        DesignStatus::Cancelled
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = AppError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as Lifecycle>::parse(s).ok_or_else(|| {
                        AppError::BadRequest(format!("Invalid {} status", <$ty as Lifecycle>::NAME))
                    })
                }
            }
        )*
    };
}

display_via_as_str!(OrderStatus, RequestStatus, DesignStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_orders() -> [OrderStatus; 6] {
        use OrderStatus::*;
        [Pending, Confirmed, InProgress, Completed, Cancelled, Refunded]
    }

    #[test]
    fn order_happy_path_is_allowed() {
        use OrderStatus::*;
        let mut status = Pending;
        for next in [Confirmed, InProgress, Completed, Refunded] {
            status = status.transition(next).unwrap();
        }
        assert_eq!(status, Refunded);
        assert!(status.is_terminal());
    }

    #[test]
    fn completed_order_cannot_go_back_or_be_cancelled() {
        use OrderStatus::*;
        assert!(Completed.transition(Pending).is_err());
        assert!(Completed.transition(Cancelled).is_err());
        assert!(Cancelled.transition(Cancelled).is_err());
        assert!(Pending.transition(Cancelled).is_ok());
    }

    #[test]
    fn status_strings_round_trip_for_every_variant() {
        for status in all_orders() {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn design_order_cannot_cancel_from_production_onwards() {
        use DesignStatus::*;
        for late in [InProduction, Shipped, Completed] {
            assert!(!late.can_transition_to(Cancelled), "{late:?}");
        }
        for early in [Pending, InReview, DesignInProgress, RevisionRequested, Approved] {
            assert!(early.can_transition_to(Cancelled), "{early:?}");
        }
    }

    #[test]
    fn request_revision_only_after_review_started() {
        use RequestStatus::*;
        assert!(!Pending.can_transition_to(RevisionRequested));
        assert!(InReview.can_transition_to(RevisionRequested));
        assert!(InProgress.can_transition_to(RevisionRequested));
        assert!(!Completed.can_transition_to(RevisionRequested));
    }

    #[test]
    fn check_transition_reports_unknown_stored_value() {
        let err = check_transition::<OrderStatus>("lost", OrderStatus::Confirmed).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
