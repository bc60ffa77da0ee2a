//! Alarm verdicts for single targets and for the summary.
//!
//! Both functions here are pure: the engine calls them on every input
//! change and never stores a verdict it did not compute from inputs.

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, BoundsCheck};

/// OK / ALARM evaluation of a target or of the whole watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Alarm,
}

impl Verdict {
    /// Status PV encoding: 1 = OK, 0 = ALARM.
    pub fn as_status(self) -> i64 {
        match self {
            Verdict::Ok => 1,
            Verdict::Alarm => 0,
        }
    }

    pub fn is_alarm(self) -> bool {
        self == Verdict::Alarm
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Alarm => "ALARM",
        }
    }
}

impl From<BoundsCheck> for Verdict {
    fn from(check: BoundsCheck) -> Self {
        match check {
            BoundsCheck::InBounds => Verdict::Ok,
            BoundsCheck::OutOfBounds => Verdict::Alarm,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a target verdict depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInputs {
    pub enabled: bool,
    pub connected: bool,
    /// Held sample, `None` while disconnected.
    pub value: Option<f64>,
    pub bounds: Bounds,
}

/// Evaluate one target.
///
/// Disabled targets are always OK. An enabled target that is not
/// connected, or has no value to check, is in ALARM.
pub fn evaluate_target(inputs: &TargetInputs) -> Verdict {
    if !inputs.enabled {
        return Verdict::Ok;
    }
    match (inputs.connected, inputs.value) {
        (true, Some(value)) => inputs.bounds.evaluate(value).into(),
        _ => Verdict::Alarm,
    }
}

/// Combine target verdicts into the summary status.
///
/// With the master switch off the summary is OK no matter what. An empty
/// set of verdicts is OK.
pub fn summarize<I>(master_enabled: bool, verdicts: I) -> Verdict
where
    I: IntoIterator<Item = Verdict>,
{
    if !master_enabled {
        return Verdict::Ok;
    }
    if verdicts.into_iter().any(Verdict::is_alarm) {
        Verdict::Alarm
    } else {
        Verdict::Ok
    }
}
