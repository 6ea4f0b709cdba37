/// Donation-request lifecycle
use crate::error::{BloodBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a donation request
///
/// ```text
/// pending ──claim──▶ inprogress ──▶ done
///    │                   │
///    └──────▶ canceled ◀─┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// Waiting for a donor
    #[default]
    Pending,
    /// Claimed by a donor
    #[serde(rename = "inprogress")]
    InProgress,
    /// Blood was donated
    Done,
    /// Withdrawn
    Canceled,
}

impl DonationStatus {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::InProgress => "inprogress",
            DonationStatus::Done => "done",
            DonationStatus::Canceled => "canceled",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        use DonationStatus::{Canceled, Done, InProgress, Pending};
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Canceled) | (InProgress, Done) | (InProgress, Canceled)
        )
    }

    /// `done` and `canceled` admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Done | DonationStatus::Canceled)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = BloodBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DonationStatus::Pending),
            "inprogress" | "in-progress" | "in_progress" => Ok(DonationStatus::InProgress),
            "done" => Ok(DonationStatus::Done),
            "canceled" | "cancelled" => Ok(DonationStatus::Canceled),
            other => Err(BloodBridgeError::invalid_input(format!(
                "unknown donation status '{}'",
                other
            ))),
        }
    }
}
