use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeLabel {
    RiskOn,
    RiskOff,
}

/// Outcome of comparing the benchmark's price against its moving average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegimeAssessment {
    Determined {
        label: RegimeLabel,
        current_price: f64,
        moving_average: f64,
    },
    Undetermined {
        reason: String,
    },
}

impl RegimeAssessment {
    pub fn label(&self) -> Option<RegimeLabel> {
        match self {
            RegimeAssessment::Determined { label, .. } => Some(*label),
            RegimeAssessment::Undetermined { .. } => None,
        }
    }
}

/// Assessment plus the wording for the caller's vocabulary.
#[derive(Debug, Clone, Serialize)]
pub struct RegimeView {
    pub benchmark: String,
    pub assessment: RegimeAssessment,
    pub display: String,
    pub reason: String,
}
