// Derived field engine - builds one derived record from the snapshot history
use crate::domain::derived::{DerivedField, DerivedRecord, FieldValue};
use crate::domain::error::DashboardError;
use crate::domain::registry::{FieldDefinition, FieldRegistry, FieldSource};
use crate::domain::snapshot::{RawValue, Snapshot, SnapshotStore};

/// Result of one derivation pass.
#[derive(Debug)]
pub struct Derivation {
    pub record: DerivedRecord,
    /// Fields left out of the record because their raw inputs were unusable
    pub failures: Vec<DashboardError>,
}

/// Derive every registry field from the newest snapshot (and the one before it for rates).
///
/// A field whose raw input is missing is reported in `failures` and omitted,
/// it is never substituted with zero.
pub fn derive(store: &SnapshotStore, registry: &FieldRegistry) -> Result<Derivation, DashboardError> {
    let current = store.last(1)?;
    let previous = store.last(2).ok();

    let mut fields = Vec::with_capacity(registry.fields.len());
    let mut failures = Vec::new();

    for definition in &registry.fields {
        match derive_value(definition, current, previous) {
            Ok(value) => fields.push(DerivedField::new(definition.name.clone(), value)),
            Err(e) => failures.push(e),
        }
    }

    tracing::debug!(
        "Derived {} fields ({} failed) from {} snapshots",
        fields.len(),
        failures.len(),
        store.len()
    );

    Ok(Derivation {
        record: DerivedRecord::new(fields),
        failures,
    })
}

fn derive_value(
    definition: &FieldDefinition,
    current: &Snapshot,
    previous: Option<&Snapshot>,
) -> Result<FieldValue, DashboardError> {
    let name = definition.name.as_str();

    match &definition.source {
        FieldSource::Raw { key } => {
            let key = key.as_deref().unwrap_or(name);
            match current.require(name, key)? {
                RawValue::Number(n) => Ok(FieldValue::Number(*n)),
                RawValue::Flag(b) => Ok(FieldValue::Flag(*b)),
                RawValue::Text(s) => Ok(FieldValue::Text(s.clone())),
                RawValue::Numbers(_) => Err(DashboardError::InvalidField {
                    key: key.to_string(),
                    expected: "scalar",
                }),
            }
        }
        FieldSource::Rate { counter } => {
            let Some(previous) = previous else {
                return Ok(FieldValue::Number(0.0));
            };
            let dx = current.number(name, counter)? - previous.number(name, counter)?;
            let dt = current.timestamp() - previous.timestamp();
            if dt <= 0.0 {
                tracing::warn!(
                    "Non-increasing timestamps ({} -> {}), {} falls back to 0",
                    previous.timestamp(),
                    current.timestamp(),
                    name
                );
                return Ok(FieldValue::Number(0.0));
            }
            // percentage of the counter's unit per second
            Ok(FieldValue::Number(dx / dt * 100.0))
        }
        FieldSource::Interval => {
            let dt = previous
                .map(|p| current.timestamp() - p.timestamp())
                .unwrap_or(0.0);
            Ok(FieldValue::Number(dt))
        }
        FieldSource::Elapsed { since } => {
            Ok(FieldValue::Number(current.timestamp() - current.number(name, since)?))
        }
        FieldSource::ConnectionType { wlan, eth } => {
            let kind = if current.flag(name, wlan)? {
                "wlan"
            } else if current.flag(name, eth)? {
                "ethernet"
            } else {
                "off"
            };
            Ok(FieldValue::Text(kind.to_string()))
        }
    }
}
