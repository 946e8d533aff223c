//! # Status Enums and Transition Tables
//!
//! ```text
//! Shipment:
//!   PENDING ──▶ OFFERS_READY ──▶ PENDING_ACCEPT ──▶ ACCEPTED ──▶ IN_PROGRESS ──▶ COMPLETE
//!
//! Offer:
//!   ACTIVE ──▶ ACCEPTED | PASSED | REVOKED   (all terminal)
//! ```
//!
//! A shipment with no eligible drivers stays in `PENDING`; the allocator
//! never re-scans it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Shipment Status ─────────────────────────────────────────────────

/// Lifecycle status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipmentStatus {
    /// Created; offers not yet extended (or nobody was eligible).
    #[serde(rename = "PENDING")]
    Pending,
    /// Offers extended; drivers may accept or pass.
    #[serde(rename = "OFFERS_READY")]
    OffersReady,
    /// An acceptance won the race and is revoking sibling offers.
    #[serde(rename = "PENDING_ACCEPT")]
    PendingAccept,
    /// Exactly one offer accepted; the others revoked or passed.
    #[serde(rename = "ACCEPTED")]
    Accepted,
    /// Being delivered. Entered by fulfillment only.
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    /// Delivered. Terminal.
    #[serde(rename = "COMPLETE")]
    Complete,
}

impl ShipmentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ShipmentStatus; 6] = [
        Self::Pending,
        Self::OffersReady,
        Self::PendingAccept,
        Self::Accepted,
        Self::InProgress,
        Self::Complete,
    ];

    /// The canonical wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::OffersReady => "OFFERS_READY",
            Self::PendingAccept => "PENDING_ACCEPT",
            Self::Accepted => "ACCEPTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
        }
    }

    /// Parse a canonical name. Returns `None` for anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PENDING" => Some(Self::Pending),
            "OFFERS_READY" => Some(Self::OffersReady),
            "PENDING_ACCEPT" => Some(Self::PendingAccept),
            "ACCEPTED" => Some(Self::Accepted),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETE" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Return the set of valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [ShipmentStatus] {
        match self {
            Self::Pending => &[Self::OffersReady],
            Self::OffersReady => &[Self::PendingAccept],
            Self::PendingAccept => &[Self::Accepted],
            Self::Accepted => &[Self::InProgress],
            Self::InProgress => &[Self::Complete],
            Self::Complete => &[],
        }
    }

    /// Whether `to` is reachable in one step.
    pub fn can_transition_to(&self, to: ShipmentStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a single-step transition.
    pub fn transition_to(self, to: ShipmentStatus) -> Result<ShipmentStatus, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError::Shipment { from: self, to })
        }
    }

    /// Whether drivers may still respond to offers of this shipment.
    pub fn is_open_for_offers(&self) -> bool {
        matches!(self, Self::OffersReady)
    }

    /// Whether an acceptance has been recorded.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress | Self::Complete)
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownStatus {
            kind: "shipment",
            value: s.to_string(),
        })
    }
}

// ─── Offer Status ────────────────────────────────────────────────────

/// Lifecycle status of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OfferStatus {
    /// Outstanding; the driver may accept or pass.
    #[serde(rename = "ACTIVE")]
    Active,
    /// The driver accepted and won the shipment.
    #[serde(rename = "ACCEPTED")]
    Accepted,
    /// The driver declined.
    #[serde(rename = "PASSED")]
    Passed,
    /// Another driver's acceptance closed this offer.
    #[serde(rename = "REVOKED")]
    Revoked,
}

impl OfferStatus {
    /// Every status.
    pub const ALL: [OfferStatus; 4] = [Self::Active, Self::Accepted, Self::Passed, Self::Revoked];

    /// The canonical wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Accepted => "ACCEPTED",
            Self::Passed => "PASSED",
            Self::Revoked => "REVOKED",
        }
    }

    /// Parse a canonical name. Returns `None` for anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ACTIVE" => Some(Self::Active),
            "ACCEPTED" => Some(Self::Accepted),
            "PASSED" => Some(Self::Passed),
            "REVOKED" => Some(Self::Revoked),
            _ => None,
        }
    }

    /// Return the set of valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [OfferStatus] {
        match self {
            Self::Active => &[Self::Accepted, Self::Passed, Self::Revoked],
            Self::Accepted | Self::Passed | Self::Revoked => &[],
        }
    }

    /// Whether `to` is reachable in one step.
    pub fn can_transition_to(&self, to: OfferStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a single-step transition.
    pub fn transition_to(self, to: OfferStatus) -> Result<OfferStatus, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError::Offer { from: self, to })
        }
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownStatus {
            kind: "offer",
            value: s.to_string(),
        })
    }
}

// ─── Decision ────────────────────────────────────────────────────────

/// A driver's response to an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Take the shipment.
    #[serde(rename = "ACCEPT")]
    Accept,
    /// Decline the shipment.
    #[serde(rename = "PASS")]
    Pass,
}

impl Decision {
    /// The canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Pass => "PASS",
        }
    }

    /// The offer status this decision resolves to.
    pub fn target_status(&self) -> OfferStatus {
        match self {
            Self::Accept => OfferStatus::Accepted,
            Self::Pass => OfferStatus::Passed,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = UnknownStatus;

    /// Case-insensitive: `accept`, `ACCEPT` and `Accept` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACCEPT" => Ok(Self::Accept),
            "PASS" => Ok(Self::Pass),
            _ => Err(UnknownStatus {
                kind: "decision",
                value: s.to_string(),
            }),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// A transition not present in the status table.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Shipment status cannot move from `from` to `to`.
    #[error("invalid shipment transition: {from} -> {to}")]
    Shipment {
        /// Current status.
        from: ShipmentStatus,
        /// Attempted target status.
        to: ShipmentStatus,
    },

    /// Offer status cannot move from `from` to `to`.
    #[error("invalid offer transition: {from} -> {to}")]
    Offer {
        /// Current status.
        from: OfferStatus,
        /// Attempted target status.
        to: OfferStatus,
    },
}

/// A status or decision name outside the known set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} status: {value:?}")]
pub struct UnknownStatus {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipment_happy_path_is_linear() {
        let mut status = ShipmentStatus::Pending;
        for next in &ShipmentStatus::ALL[1..] {
            status = status.transition_to(*next).unwrap();
        }
        assert_eq!(status, ShipmentStatus::Complete);
        assert!(status.is_terminal());
    }

    #[test]
    fn shipment_cannot_skip_stages() {
        let err = ShipmentStatus::Pending
            .transition_to(ShipmentStatus::Accepted)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Shipment {
                from: ShipmentStatus::Pending,
                to: ShipmentStatus::Accepted,
            }
        );
        assert!(!ShipmentStatus::OffersReady.can_transition_to(ShipmentStatus::Accepted));
    }

    #[test]
    fn shipment_cannot_move_backwards() {
        for (i, from) in ShipmentStatus::ALL.iter().enumerate() {
            for to in &ShipmentStatus::ALL[..=i] {
                assert!(
                    !from.can_transition_to(*to),
                    "{from} -> {to} must be rejected"
                );
            }
        }
    }

    #[test]
    fn offer_terminal_states_have_no_exits() {
        for terminal in [OfferStatus::Accepted, OfferStatus::Passed, OfferStatus::Revoked] {
            assert!(terminal.is_terminal());
            for to in OfferStatus::ALL {
                assert!(terminal.transition_to(to).is_err());
            }
        }
    }

    #[test]
    fn active_offer_reaches_every_terminal_state() {
        for to in [OfferStatus::Accepted, OfferStatus::Passed, OfferStatus::Revoked] {
            assert_eq!(OfferStatus::Active.transition_to(to).unwrap(), to);
        }
        assert!(OfferStatus::Active.transition_to(OfferStatus::Active).is_err());
    }

    #[test]
    fn names_round_trip_and_reject_unknown() {
        for s in ShipmentStatus::ALL {
            assert_eq!(ShipmentStatus::from_name(s.as_str()), Some(s));
        }
        for s in OfferStatus::ALL {
            assert_eq!(s.as_str().parse::<OfferStatus>().unwrap(), s);
        }
        assert_eq!(ShipmentStatus::from_name("shipped"), None);
        let err = "3".parse::<OfferStatus>().unwrap_err();
        assert_eq!(err.kind, "offer");
    }

    #[test]
    fn serde_uses_canonical_names() {
        assert_eq!(
            serde_json::to_string(&ShipmentStatus::OffersReady).unwrap(),
            "\"OFFERS_READY\""
        );
        assert_eq!(
            serde_json::to_string(&OfferStatus::Revoked).unwrap(),
            "\"REVOKED\""
        );
        assert!(serde_json::from_str::<OfferStatus>("\"EXPIRED\"").is_err());
    }

    #[test]
    fn decision_parses_case_insensitively() {
        assert_eq!("accept".parse::<Decision>().unwrap(), Decision::Accept);
        assert_eq!("PASS".parse::<Decision>().unwrap(), Decision::Pass);
        assert!("maybe".parse::<Decision>().is_err());
        assert_eq!(Decision::Accept.target_status(), OfferStatus::Accepted);
        assert_eq!(Decision::Pass.target_status(), OfferStatus::Passed);
    }

    #[test]
    fn accepted_family() {
        assert!(!ShipmentStatus::PendingAccept.is_accepted());
        assert!(ShipmentStatus::Accepted.is_accepted());
        assert!(ShipmentStatus::Complete.is_accepted());
        assert!(ShipmentStatus::OffersReady.is_open_for_offers());
        assert!(!ShipmentStatus::Pending.is_open_for_offers());
    }
}
