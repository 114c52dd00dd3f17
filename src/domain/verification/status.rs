//! Vendor status enum and the one progress table every route reads from.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a vendor verification session.
///
/// Serialized with the vendor's own spelling (`"In Review"`), so stored rows and API
/// responses read the same as the webhook payloads that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    NotStarted,
    InProgress,
    InReview,
    Approved,
    Declined,
    Abandoned,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verification status '{0}'")]
pub struct UnknownStatus(pub String);

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 7] = [
        VerificationStatus::NotStarted,
        VerificationStatus::InProgress,
        VerificationStatus::InReview,
        VerificationStatus::Approved,
        VerificationStatus::Declined,
        VerificationStatus::Abandoned,
        VerificationStatus::Expired,
    ];

    /// The vendor's wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::NotStarted => "Not Started",
            VerificationStatus::InProgress => "In Progress",
            VerificationStatus::InReview => "In Review",
            VerificationStatus::Approved => "Approved",
            VerificationStatus::Declined => "Declined",
            VerificationStatus::Abandoned => "Abandoned",
            VerificationStatus::Expired => "Expired",
        }
    }

    /// Progress percentage shown to the user.
    pub fn progress(&self) -> u8 {
        match self {
            VerificationStatus::NotStarted => 15,
            VerificationStatus::InProgress => 30,
            VerificationStatus::InReview => 85,
            VerificationStatus::Approved
            | VerificationStatus::Declined
            | VerificationStatus::Abandoned
            | VerificationStatus::Expired => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerificationStatus::NotStarted => "Verification not started",
            VerificationStatus::InProgress => "Verification in progress",
            VerificationStatus::InReview => "Verification under review",
            VerificationStatus::Approved => "Verification approved",
            VerificationStatus::Declined => "Verification declined",
            VerificationStatus::Abandoned => "Verification abandoned",
            VerificationStatus::Expired => "Verification expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 3
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, VerificationStatus::Approved)
    }

    /// Position in the lifecycle. All terminal states share the top rank.
    pub fn rank(&self) -> u8 {
        match self {
            VerificationStatus::NotStarted => 0,
            VerificationStatus::InProgress => 1,
            VerificationStatus::InReview => 2,
            VerificationStatus::Approved
            | VerificationStatus::Declined
            | VerificationStatus::Abandoned
            | VerificationStatus::Expired => 3,
        }
    }

    /// Whether a session currently in `self` may move to `next`.
    ///
    /// Sessions never move backwards; terminal states may still replace each other
    /// because a manual review can overturn an automatic decision.
    pub fn can_advance_to(&self, next: VerificationStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "notstarted" => Ok(VerificationStatus::NotStarted),
            "inprogress" => Ok(VerificationStatus::InProgress),
            "inreview" => Ok(VerificationStatus::InReview),
            "approved" => Ok(VerificationStatus::Approved),
            "declined" => Ok(VerificationStatus::Declined),
            "abandoned" => Ok(VerificationStatus::Abandoned),
            "expired" => Ok(VerificationStatus::Expired),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl Serialize for VerificationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VerificationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
