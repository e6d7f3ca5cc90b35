// Raw measurement snapshots and their arrival-ordered store
use super::error::DashboardError;
use serde::{Deserialize, Serialize};

/// Name of the entry every snapshot must carry (seconds).
pub const TIMESTAMP_KEY: &str = "timestamp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Numbers(Vec<f64>),
}

impl RawValue {
    fn kind(&self) -> &'static str {
        match self {
            RawValue::Flag(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "string",
            RawValue::Numbers(_) => "number list",
        }
    }
}

/// One `{title, value}` pair as delivered by the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub title: String,
    pub value: RawValue,
}

impl Measurement {
    #[cfg(test)]
    pub fn new(title: impl Into<String>, value: RawValue) -> Self {
        Self {
            title: title.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    timestamp: f64,
    measurements: Vec<Measurement>,
}

impl Snapshot {
    pub fn from_measurements(measurements: Vec<Measurement>) -> Result<Self, DashboardError> {
        let timestamp = number_in(&measurements, TIMESTAMP_KEY, TIMESTAMP_KEY)?;
        Ok(Self {
            timestamp,
            measurements,
        })
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.measurements
            .iter()
            .find(|m| m.title == key)
            .map(|m| &m.value)
    }

    /// Numeric value of `key`, reporting `field` as the consumer when it is absent.
    pub fn number(&self, field: &str, key: &str) -> Result<f64, DashboardError> {
        number_in(&self.measurements, field, key)
    }

    pub fn flag(&self, field: &str, key: &str) -> Result<bool, DashboardError> {
        match self.require(field, key)? {
            RawValue::Flag(b) => Ok(*b),
            // backends emitting 0/1 for flags are accepted
            RawValue::Number(n) => Ok(*n != 0.0),
            _ => Err(DashboardError::InvalidField {
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }

    pub fn require(&self, field: &str, key: &str) -> Result<&RawValue, DashboardError> {
        self.get(key).ok_or_else(|| DashboardError::MissingField {
            field: field.to_string(),
            key: key.to_string(),
        })
    }
}

fn number_in(measurements: &[Measurement], field: &str, key: &str) -> Result<f64, DashboardError> {
    let value = measurements
        .iter()
        .find(|m| m.title == key)
        .map(|m| &m.value)
        .ok_or_else(|| DashboardError::MissingField {
            field: field.to_string(),
            key: key.to_string(),
        })?;

    match value {
        RawValue::Number(n) => Ok(*n),
        other => {
            tracing::debug!("{} holds a {}, expected a number", key, other.kind());
            Err(DashboardError::InvalidField {
                key: key.to_string(),
                expected: "number",
            })
        }
    }
}

/// Append-only history of snapshots in arrival order.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    history: Vec<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot);
    }

    /// The `n`-th most recent snapshot; `last(1)` is the newest.
    pub fn last(&self, n: usize) -> Result<&Snapshot, DashboardError> {
        if n == 0 || n > self.history.len() {
            return Err(DashboardError::OutOfRange {
                requested: n,
                length: self.history.len(),
            });
        }
        Ok(&self.history[self.history.len() - n])
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
