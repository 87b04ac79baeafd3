use super::{error::BookingError, role::Role};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    PaidSearching,
    Accepted,
    EnRoute,
    Arrived,
    InProgress,
    CompletePending,
    NeedsReview,
    Closed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::PaidSearching => "PAID_SEARCHING",
            Self::Accepted => "ACCEPTED",
            Self::EnRoute => "EN_ROUTE",
            Self::Arrived => "ARRIVED",
            Self::InProgress => "IN_PROGRESS",
            Self::CompletePending => "COMPLETE_PENDING",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Closed => "CLOSED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled | Self::Expired)
    }

    /// `state == CLOSED`.
    pub fn is_eligible_for_payout(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Void-without-fee eligibility: only while still searching for a
    /// provider, before any on-site work could have happened.
    pub fn is_eligible_for_refund(&self) -> bool {
        matches!(self, Self::PaidSearching)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = BookingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "PAID_SEARCHING" => Ok(Self::PaidSearching),
            "ACCEPTED" => Ok(Self::Accepted),
            "EN_ROUTE" => Ok(Self::EnRoute),
            "ARRIVED" => Ok(Self::Arrived),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETE_PENDING" => Ok(Self::CompletePending),
            "NEEDS_REVIEW" => Ok(Self::NeedsReview),
            "CLOSED" => Ok(Self::Closed),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(BookingError::Validation(format!("unknown booking status: {other}"))),
        }
    }
}

/// Exhaustive transition table. Every allowed `(from, to, role)` edge is
/// listed explicitly. If it's not here, it's not allowed — semantic gates
/// (OTP, candidacy, ownership, grace window) are layered on top by the
/// booking engine and never relax this table.
pub fn can_transition(from: BookingStatus, to: BookingStatus, role: Role) -> bool {
    use BookingStatus::*;
    use Role::*;

    matches!(
        (from, to, role),
        (PendingPayment, PaidSearching, System)
            | (PendingPayment, Cancelled, User)
            | (PendingPayment, Expired, System)
            | (PaidSearching, Accepted, Provider)
            | (PaidSearching, Cancelled, User)
            | (PaidSearching, Expired, System)
            | (Accepted, EnRoute, Provider)
            | (Accepted, PaidSearching, Provider)
            | (Accepted, Cancelled, User)
            | (Accepted, Cancelled, Provider)
            | (EnRoute, Arrived, Provider)
            | (EnRoute, PaidSearching, Provider)
            | (EnRoute, Cancelled, User)
            | (EnRoute, Cancelled, Provider)
            | (Arrived, InProgress, Provider)
            | (Arrived, Cancelled, User)
            | (Arrived, Cancelled, Provider)
            | (InProgress, CompletePending, Provider)
            | (CompletePending, Closed, System)
            | (CompletePending, NeedsReview, User)
            | (NeedsReview, Closed, Admin)
            | (NeedsReview, Cancelled, Admin)
    )
}

/// Entry point into `PENDING_PAYMENT` is not a transition (there is no
/// `from`), so it is validated separately at creation time rather than
/// through `can_transition`.
pub fn can_create() -> BookingStatus {
    BookingStatus::PendingPayment
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;
    use Role::*;

    #[test]
    fn happy_path_is_fully_connected() {
        assert!(can_transition(PendingPayment, PaidSearching, System));
        assert!(can_transition(PaidSearching, Accepted, Provider));
        assert!(can_transition(Accepted, EnRoute, Provider));
        assert!(can_transition(EnRoute, Arrived, Provider));
        assert!(can_transition(Arrived, InProgress, Provider));
        assert!(can_transition(InProgress, CompletePending, Provider));
        assert!(can_transition(CompletePending, Closed, System));
    }

    #[test]
    fn wrong_role_is_rejected() {
        assert!(!can_transition(PaidSearching, Accepted, User));
        assert!(!can_transition(PendingPayment, PaidSearching, User));
        assert!(!can_transition(CompletePending, Closed, User));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for role in [User, Provider, System, Admin] {
            for to in [
                PendingPayment,
                PaidSearching,
                Accepted,
                EnRoute,
                Arrived,
                InProgress,
                CompletePending,
                NeedsReview,
                Closed,
                Cancelled,
                Expired,
            ] {
                assert!(!can_transition(Closed, to, role));
                assert!(!can_transition(Cancelled, to, role));
                assert!(!can_transition(Expired, to, role));
            }
        }
    }

    #[test]
    fn redispatch_from_accepted_and_en_route() {
        assert!(can_transition(Accepted, PaidSearching, Provider));
        assert!(can_transition(EnRoute, PaidSearching, Provider));
        assert!(!can_transition(Arrived, PaidSearching, Provider));
    }

    #[test]
    fn needs_review_resolved_only_by_admin() {
        assert!(can_transition(NeedsReview, Closed, Admin));
        assert!(can_transition(NeedsReview, Cancelled, Admin));
        assert!(!can_transition(NeedsReview, Closed, User));
        assert!(!can_transition(NeedsReview, Closed, Provider));
    }

    #[test]
    fn eligibility_predicates_agree_with_table() {
        assert!(Closed.is_eligible_for_payout());
        assert!(!Accepted.is_eligible_for_payout());
        assert!(PaidSearching.is_eligible_for_refund());
        assert!(!Accepted.is_eligible_for_refund());
    }

    #[test]
    fn status_str_roundtrip() {
        for s in [
            PendingPayment,
            PaidSearching,
            Accepted,
            EnRoute,
            Arrived,
            InProgress,
            CompletePending,
            NeedsReview,
            Closed,
            Cancelled,
            Expired,
        ] {
            assert_eq!(BookingStatus::try_from(s.as_str()).unwrap(), s);
        }
    }
}
