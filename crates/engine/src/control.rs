//! Named control points over the registry.
//!
//! [`ControlSurface`] maps the PV names this process publishes onto
//! watcher and aggregator operations. It is transport-agnostic: the HTTP
//! server calls [`ControlSurface::read`] / [`ControlSurface::write`] with
//! names taken straight from the request path.
//!
//! | PV                        | Access | Encoding             |
//! |---------------------------|--------|----------------------|
//! | `T`                       | read   | last value or null   |
//! | `T:ENABLE`                | write  | 0 / 1                |
//! | `T:LOW`, `T:HIGH`         | write  | number               |
//! | `T:STATUS`                | read   | 1 = OK, 0 = ALARM    |
//! | `MONITOR:MASTER_ENABLE`   | write  | 0 / 1                |
//! | `MONITOR:SUMMARY_STATUS`  | read   | 1 = OK, 0 = ALARM    |

use std::sync::Arc;

use pvwatch_core::error::CoreError;
use pvwatch_core::pv_names::{
    self, MASTER_ENABLE, SUFFIX_ENABLE, SUFFIX_HIGH, SUFFIX_LOW, SUFFIX_STATUS, SUMMARY_STATUS,
};
use serde::Serialize;

use crate::registry::WatcherRegistry;
use crate::watcher::TargetSnapshot;

/// Which per-target PV an address refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    Value,
    Enable,
    Low,
    High,
    Status,
}

impl TargetField {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            SUFFIX_ENABLE => Some(Self::Enable),
            SUFFIX_LOW => Some(Self::Low),
            SUFFIX_HIGH => Some(Self::High),
            SUFFIX_STATUS => Some(Self::Status),
            _ => None,
        }
    }

    fn is_writable(self) -> bool {
        matches!(self, Self::Enable | Self::Low | Self::High)
    }
}

/// A resolved PV name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PvAddress {
    MasterEnable,
    SummaryStatus,
    Target { target: String, field: TargetField },
}

impl PvAddress {
    pub fn is_writable(&self) -> bool {
        match self {
            PvAddress::MasterEnable => true,
            PvAddress::SummaryStatus => false,
            PvAddress::Target { field, .. } => field.is_writable(),
        }
    }
}

/// Value of a PV as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PvValue {
    Int(i64),
    Double(f64),
    /// No value is available (the target is disconnected).
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PvReading {
    pub name: String,
    pub value: PvValue,
    pub writable: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Unknown PV: {0}")]
    UnknownPv(String),

    #[error("PV {0} is read-only")]
    ReadOnly(String),

    #[error("Invalid value for {pv}: {reason}")]
    InvalidValue { pv: String, reason: String },

    #[error(transparent)]
    Rejected(#[from] CoreError),
}

pub struct ControlSurface {
    registry: Arc<WatcherRegistry>,
}

impl ControlSurface {
    pub fn new(registry: Arc<WatcherRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WatcherRegistry> {
        &self.registry
    }

    /// Map a PV name to what it controls.
    pub fn resolve(&self, name: &str) -> Result<PvAddress, ControlError> {
        match name {
            MASTER_ENABLE => return Ok(PvAddress::MasterEnable),
            SUMMARY_STATUS => return Ok(PvAddress::SummaryStatus),
            _ => {}
        }

        if self.registry.contains(name) {
            return Ok(PvAddress::Target {
                target: name.to_string(),
                field: TargetField::Value,
            });
        }

        if let Some((target, suffix)) = name.rsplit_once(':') {
            if let Some(field) = TargetField::from_suffix(suffix) {
                if self.registry.contains(target) {
                    return Ok(PvAddress::Target {
                        target: target.to_string(),
                        field,
                    });
                }
            }
        }

        Err(ControlError::UnknownPv(name.to_string()))
    }

    pub fn read(&self, name: &str) -> Result<PvReading, ControlError> {
        let address = self.resolve(name)?;
        self.read_address(name, &address)
    }

    /// Write `value` to a writable PV and return its new reading.
    ///
    /// Boolean PVs take a JSON bool or number (non-zero is true); bounds
    /// take a JSON number.
    pub async fn write(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<PvReading, ControlError> {
        let address = self.resolve(name)?;
        if !address.is_writable() {
            return Err(ControlError::ReadOnly(name.to_string()));
        }

        match &address {
            PvAddress::MasterEnable => {
                let enabled = parse_flag(name, value)?;
                self.registry
                    .aggregator()
                    .set_master_enabled(enabled)
                    .await;
            }
            PvAddress::Target { target, field } => {
                let watcher = self
                    .registry
                    .get(target)
                    .ok_or_else(|| ControlError::UnknownPv(name.to_string()))?;
                match field {
                    TargetField::Enable => watcher.set_enabled(parse_flag(name, value)?).await,
                    TargetField::Low => watcher.set_low(parse_number(name, value)?).await?,
                    TargetField::High => watcher.set_high(parse_number(name, value)?).await?,
                    TargetField::Value | TargetField::Status => {
                        return Err(ControlError::ReadOnly(name.to_string()))
                    }
                }
            }
            PvAddress::SummaryStatus => return Err(ControlError::ReadOnly(name.to_string())),
        }

        self.read_address(name, &address)
    }

    /// Every published PV: the process-wide pair first, then each
    /// target's PVs in configuration order.
    pub fn list(&self) -> Vec<PvReading> {
        let mut readings = Vec::with_capacity(2 + self.registry.len() * 5);
        for name in [MASTER_ENABLE, SUMMARY_STATUS] {
            if let Ok(reading) = self.read(name) {
                readings.push(reading);
            }
        }
        for watcher in self.registry.watchers() {
            let snapshot = watcher.snapshot();
            for pv in pv_names::target_pvs(watcher.name()) {
                if let Ok(PvAddress::Target { field, .. }) = self.resolve(&pv) {
                    readings.push(reading_for(pv, field, &snapshot));
                }
            }
        }
        readings
    }

    fn read_address(&self, name: &str, address: &PvAddress) -> Result<PvReading, ControlError> {
        match address {
            PvAddress::MasterEnable => Ok(PvReading {
                name: name.to_string(),
                value: PvValue::Int(i64::from(self.registry.aggregator().master_enabled())),
                writable: true,
            }),
            PvAddress::SummaryStatus => Ok(PvReading {
                name: name.to_string(),
                value: PvValue::Int(self.registry.aggregator().summary().as_status()),
                writable: false,
            }),
            PvAddress::Target { target, field } => {
                let watcher = self
                    .registry
                    .get(target)
                    .ok_or_else(|| ControlError::UnknownPv(name.to_string()))?;
                Ok(reading_for(name.to_string(), *field, &watcher.snapshot()))
            }
        }
    }
}

fn reading_for(name: String, field: TargetField, snapshot: &TargetSnapshot) -> PvReading {
    let value = match field {
        TargetField::Value => snapshot.value.map_or(PvValue::Absent, PvValue::Double),
        TargetField::Enable => PvValue::Int(i64::from(snapshot.enabled)),
        TargetField::Low => PvValue::Double(snapshot.low),
        TargetField::High => PvValue::Double(snapshot.high),
        TargetField::Status => PvValue::Int(snapshot.verdict.as_status()),
    };
    PvReading {
        name,
        value,
        writable: field.is_writable(),
    }
}

fn parse_flag(pv: &str, value: &serde_json::Value) -> Result<bool, ControlError> {
    match value {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(|f| f != 0.0)
            .ok_or_else(|| invalid(pv, "number out of range")),
        _ => Err(invalid(pv, "expected a boolean or 0/1")),
    }
}

fn parse_number(pv: &str, value: &serde_json::Value) -> Result<f64, ControlError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(pv, "expected a number"))
}

fn invalid(pv: &str, reason: &str) -> ControlError {
    ControlError::InvalidValue {
        pv: pv.to_string(),
        reason: reason.to_string(),
    }
}
