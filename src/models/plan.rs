//! Studio plans and their headshot allotments.

use serde::{Deserialize, Serialize};

use super::credits::CreditType;

/// Each prediction returns this many images.
pub const IMAGES_PER_PREDICTION: u32 = 4;

/// Plan a studio was purchased under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Professional,
    Studio,
    Team,
}

impl Plan {
    /// Parse a plan name case-insensitively. `pro` is accepted for `professional`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Some(Self::Starter),
            "professional" | "pro" => Some(Self::Professional),
            "studio" => Some(Self::Studio),
            "team" => Some(Self::Team),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Studio => "studio",
            Self::Team => "team",
        }
    }

    /// Total headshots delivered for the plan.
    pub fn headshots(&self) -> u32 {
        match self {
            Self::Starter => 20,
            Self::Professional => 40,
            Self::Studio => 80,
            Self::Team => 80,
        }
    }

    /// Number of prompts (and predictions) needed to deliver the allotment.
    pub fn prompt_count(&self) -> usize {
        (self.headshots() / IMAGES_PER_PREDICTION) as usize
    }

    /// Credit bucket consumed when a studio is created on this plan.
    pub fn credit_type(&self) -> CreditType {
        match self {
            Self::Starter => CreditType::Starter,
            Self::Professional => CreditType::Pro,
            Self::Studio => CreditType::Studio,
            Self::Team => CreditType::Team,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
