//! Return lifecycle stages.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage of a garment on its way back through reverse logistics.
///
/// The same closed set serves as the queued event kind and as the order's
/// return status; each stage maps to exactly one order mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStage {
    Received,
    Cleaning,
    Repair,
    Qa,
    Available,
}

impl ReturnStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStage::Received => "received",
            ReturnStage::Cleaning => "cleaning",
            ReturnStage::Repair => "repair",
            ReturnStage::Qa => "qa",
            ReturnStage::Available => "available",
        }
    }
}

impl core::fmt::Display for ReturnStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the closed stage set.
///
/// Producers may ship kinds this version does not know about; the event
/// processor treats those as a counted no-op rather than an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown return stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for ReturnStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(ReturnStage::Received),
            "cleaning" => Ok(ReturnStage::Cleaning),
            "repair" => Ok(ReturnStage::Repair),
            "qa" => Ok(ReturnStage::Qa),
            "available" => Ok(ReturnStage::Available),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}
