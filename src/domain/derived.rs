// Derived records - one computed field set per poll cycle
use super::error::DashboardError;
use super::registry::FieldRegistry;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Numeric view used for charting; flags chart as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(_) => None,
        }
    }
}

/// One computed value. Formatting and chart bindings live in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedField {
    pub name: String,
    pub value: FieldValue,
}

impl DerivedField {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Format the value with the formatter the registry declares for this field.
    pub fn display(&self, registry: &FieldRegistry) -> Result<String, DashboardError> {
        Ok(registry.lookup(&self.name)?.format.format(&self.value))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedRecord {
    fields: Vec<DerivedField>,
}

impl DerivedRecord {
    pub fn new(fields: Vec<DerivedField>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&DerivedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[DerivedField] {
        &self.fields
    }
}

#[derive(Debug, Default)]
pub struct DerivedHistory {
    history: Vec<DerivedRecord>,
}

impl DerivedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DerivedRecord) {
        self.history.push(record);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn latest_record(&self) -> Result<&DerivedRecord, DashboardError> {
        self.history.last().ok_or(DashboardError::EmptyHistory)
    }

    /// Values of `name` across all records in arrival order.
    ///
    /// Records where the field was omitted (its raw input was missing that
    /// cycle) contribute nothing, so a chart simply does not advance.
    pub fn value_list(&self, name: &str) -> Result<Vec<FieldValue>, DashboardError> {
        let values: Vec<FieldValue> = self
            .history
            .iter()
            .filter_map(|record| record.get(name).map(|f| f.value.clone()))
            .collect();

        if values.is_empty() {
            return Err(DashboardError::FieldNotFound(name.to_string()));
        }
        Ok(values)
    }

    /// The last `limit` values of `name` in arrival order, walking back from the
    /// newest record only as far as needed.
    pub fn recent_values(&self, name: &str, limit: usize) -> Result<Vec<FieldValue>, DashboardError> {
        let mut values: Vec<FieldValue> = self
            .history
            .iter()
            .rev()
            .filter_map(|record| record.get(name).map(|f| f.value.clone()))
            .take(limit)
            .collect();

        if values.is_empty() {
            return Err(DashboardError::FieldNotFound(name.to_string()));
        }
        values.reverse();
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::{FieldDefinition, FieldSource, Formatter};

    fn field(name: &str, value: f64) -> DerivedField {
        DerivedField::new(name, FieldValue::Number(value))
    }

    #[test]
    fn test_value_list_follows_arrival_order() {
        let mut history = DerivedHistory::new();
        for i in 0..4 {
            history.push(DerivedRecord::new(vec![
                field("ram_used", i as f64 * 100.0),
                field("ram_total", 1000.0),
            ]));
        }

        let values = history.value_list("ram_used").unwrap();
        assert_eq!(values.len(), history.len());
        assert_eq!(
            values,
            vec![
                FieldValue::Number(0.0),
                FieldValue::Number(100.0),
                FieldValue::Number(200.0),
                FieldValue::Number(300.0),
            ]
        );
    }

    #[test]
    fn test_value_list_unknown_field() {
        let mut history = DerivedHistory::new();
        history.push(DerivedRecord::new(vec![field("ram_used", 1.0)]));

        assert_eq!(
            history.value_list("swap_used"),
            Err(DashboardError::FieldNotFound("swap_used".to_string()))
        );
    }

    #[test]
    fn test_latest_record() {
        let mut history = DerivedHistory::new();
        assert_eq!(history.latest_record(), Err(DashboardError::EmptyHistory));

        history.push(DerivedRecord::new(vec![field("ram_used", 1.0)]));
        history.push(DerivedRecord::new(vec![field("ram_used", 2.0)]));

        let registry = FieldRegistry::new(vec![FieldDefinition {
            name: "ram_used".to_string(),
            source: FieldSource::Raw { key: None },
            format: Formatter::Scaled {
                suffix: "B".to_string(),
                digits: 3,
            },
            chart: None,
        }]);
        let latest = history.latest_record().unwrap();
        assert_eq!(latest.get("ram_used").unwrap().display(&registry).unwrap(), "2.00B");

        let unregistered = field("swap_used", 1.0);
        assert_eq!(
            unregistered.display(&registry),
            Err(DashboardError::UnknownField("swap_used".to_string()))
        );
    }

    #[test]
    fn test_recent_values_window_past_limit() {
        let mut history = DerivedHistory::new();
        for i in 0..250 {
            let mut fields = vec![field("ram_total", 1000.0)];
            // ram_used is omitted every tenth cycle
            if i % 10 != 0 {
                fields.push(field("ram_used", i as f64));
            }
            history.push(DerivedRecord::new(fields));
        }

        let recent = history.recent_values("ram_used", 100).unwrap();
        let full = history.value_list("ram_used").unwrap();
        assert_eq!(recent.len(), 100);
        assert_eq!(recent[..], full[full.len() - 100..]);
        assert_eq!(recent.last(), Some(&FieldValue::Number(249.0)));

        let short = history.recent_values("ram_total", 1000).unwrap();
        assert_eq!(short.len(), 250);
        assert_eq!(
            history.recent_values("swap_used", 100),
            Err(DashboardError::FieldNotFound("swap_used".to_string()))
        );
    }
}
