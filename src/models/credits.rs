//! Credit buckets and balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Credit bucket. Every credit mutation is keyed by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditType {
    Starter,
    #[serde(alias = "professional")]
    Pro,
    Elite,
    Studio,
    Team,
    Balance,
}

impl CreditType {
    pub const ALL: [CreditType; 6] = [
        CreditType::Starter,
        CreditType::Pro,
        CreditType::Elite,
        CreditType::Studio,
        CreditType::Team,
        CreditType::Balance,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Some(Self::Starter),
            "pro" | "professional" => Some(Self::Pro),
            "elite" => Some(Self::Elite),
            "studio" => Some(Self::Studio),
            "team" => Some(Self::Team),
            "balance" => Some(Self::Balance),
            _ => None,
        }
    }

    /// Column name used by the credit stored procedures.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "professional",
            Self::Elite => "elite",
            Self::Studio => "studio",
            Self::Team => "team",
            Self::Balance => "balance",
        }
    }
}

impl std::fmt::Display for CreditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Whether credits are drawn from the user or their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditContext {
    Personal,
    Organization,
}

impl CreditContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Organization => "ORGANIZATION",
        }
    }
}

/// Balance per credit bucket. Missing buckets read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance(BTreeMap<CreditType, i64>);

impl CreditBalance {
    pub fn get(&self, credit_type: CreditType) -> i64 {
        self.0.get(&credit_type).copied().unwrap_or(0)
    }

    pub fn set(&mut self, credit_type: CreditType, amount: i64) {
        self.0.insert(credit_type, amount);
    }

    pub fn has_at_least(&self, credit_type: CreditType, amount: i64) -> bool {
        self.get(credit_type) >= amount
    }
}

/// Result envelope returned by the credit stored procedures.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditRpcResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}
