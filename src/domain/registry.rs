// Field registry - declarative table of every known dashboard field
use super::derived::FieldValue;
use super::error::DashboardError;
use super::units::{format_duration, format_scaled};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldRegistry {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl FieldRegistry {
    #[cfg(test)]
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    pub fn lookup(&self, name: &str) -> Result<&FieldDefinition, DashboardError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DashboardError::UnknownField(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub source: FieldSource,
    pub format: Formatter,
    #[serde(default)]
    pub chart: Option<ChartSpec>,
}

/// How a field's value is obtained from the snapshot history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Copied from the current snapshot, under `key` when it differs from the field name.
    Raw {
        #[serde(default)]
        key: Option<String>,
    },
    /// Percentage rate of a monotonically increasing counter between the last two snapshots.
    Rate { counter: String },
    /// Seconds between the last two snapshots.
    Interval,
    /// `timestamp - since` on the current snapshot.
    Elapsed { since: String },
    ConnectionType { wlan: String, eth: String },
}

/// Display rule, dispatched by variant rather than carried as behaviour on each record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formatter {
    Scaled {
        #[serde(default)]
        suffix: String,
        #[serde(default = "default_digits")]
        digits: u32,
    },
    Duration,
    OnOff,
    Text,
}

fn default_digits() -> u32 {
    3
}

impl Formatter {
    pub fn format(&self, value: &FieldValue) -> String {
        match (self, value) {
            (Formatter::Scaled { suffix, digits }, FieldValue::Number(n)) => {
                format_scaled(*n, suffix, *digits)
            }
            (Formatter::Duration, FieldValue::Number(n)) => format_duration(*n),
            (Formatter::OnOff, FieldValue::Flag(b)) => on_off(*b).to_string(),
            (Formatter::OnOff, FieldValue::Number(n)) => on_off(*n != 0.0).to_string(),
            (_, FieldValue::Text(s)) => s.clone(),
            (_, FieldValue::Flag(b)) => b.to_string(),
            (_, FieldValue::Number(n)) => n.to_string(),
        }
    }

    /// Format a bare number, as chart labels do.
    pub fn format_number(&self, value: f64) -> String {
        self.format(&FieldValue::Number(value))
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Chart configuration attached to fields the dashboard graphs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
    /// Take the scale maximum from another field of the record present at association.
    #[serde(default)]
    pub max_from: Option<String>,
    #[serde(default)]
    pub markers: Vec<MarkerSpec>,
    /// Markers at fractions of the resolved maximum, labelled with the field's formatter.
    #[serde(default)]
    pub marker_fractions: Vec<f64>,
    #[serde(default = "default_true")]
    pub value_text: bool,
    #[serde(default)]
    pub dots: bool,
    /// Style overrides; unset keys keep the chart defaults
    #[serde(default)]
    pub line_width: Option<f64>,
    #[serde(default)]
    pub entry_width: Option<f64>,
    #[serde(default)]
    pub line_color: Option<String>,
    #[serde(default)]
    pub under_color: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkerSpec {
    pub label: String,
    pub value: f64,
}

fn default_true() -> bool {
    true
}
