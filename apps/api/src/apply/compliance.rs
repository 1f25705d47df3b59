//! Compliance gate: no automated submission without explicit user opt-in.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    OptOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ComplianceDecision {
    Allowed,
    Denied { reason: DenyReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Auto-apply requires explicit opt-in.")]
pub struct ComplianceError {
    pub reason: DenyReason,
}

pub fn check_compliance(opt_in: bool) -> ComplianceDecision {
    if opt_in {
        ComplianceDecision::Allowed
    } else {
        ComplianceDecision::Denied {
            reason: DenyReason::OptOut,
        }
    }
}

/// Turns a denial into an error so callers can short-circuit with `?`.
pub fn ensure_opt_in(opt_in: bool) -> Result<(), ComplianceError> {
    match check_compliance(opt_in) {
        ComplianceDecision::Allowed => Ok(()),
        ComplianceDecision::Denied { reason } => Err(ComplianceError { reason }),
    }
}
