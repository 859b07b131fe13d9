//! Client role

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of the counter a client sits on
///
/// The wire form keeps the historical names: `customer` places orders,
/// `kitchen` fulfils them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Places orders (顾客)
    #[default]
    #[serde(rename = "customer")]
    Requester,
    /// Fulfils orders (厨房)
    #[serde(rename = "kitchen")]
    Fulfiller,
}

impl Role {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requester => "customer",
            Self::Fulfiller => "kitchen",
        }
    }

    /// Human label used in notification bodies
    pub fn label(&self) -> &'static str {
        match self {
            Self::Requester => "Customer",
            Self::Fulfiller => "Kitchen",
        }
    }

    /// The other side
    pub fn counterpart(&self) -> Self {
        match self {
            Self::Requester => Self::Fulfiller,
            Self::Fulfiller => Self::Requester,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "requester" => Ok(Self::Requester),
            "kitchen" | "fulfiller" => Ok(Self::Fulfiller),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}
