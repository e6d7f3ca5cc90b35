// Dashboard frame - everything the display shows after one poll cycle
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub cycle: usize,
    pub generated_at_ms: i64,
    /// Field name to formatted value, for every scalar output
    pub fields: BTreeMap<String, String>,
    /// Field name to SVG document, for every chart target
    pub charts: BTreeMap<String, String>,
}

impl DashboardFrame {
    pub fn new(
        cycle: usize,
        generated_at_ms: i64,
        fields: BTreeMap<String, String>,
        charts: BTreeMap<String, String>,
    ) -> Self {
        Self {
            cycle,
            generated_at_ms,
            fields,
            charts,
        }
    }
}
