// Dashboard controller - owns the histories and charts of one dashboard session
use crate::application::derive_engine::derive;
use crate::domain::chart::{ChartTarget, GraphState, ReferenceMarker, WINDOW_SIZE};
use crate::domain::dashboard::DashboardFrame;
use crate::domain::derived::{DerivedHistory, DerivedRecord, FieldValue};
use crate::domain::error::DashboardError;
use crate::domain::registry::{ChartSpec, FieldDefinition, FieldRegistry};
use crate::domain::snapshot::{Snapshot, SnapshotStore};
use crate::infrastructure::config::LayoutConfig;
use std::collections::BTreeMap;

/// Outcome of one ingested snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: usize,
    /// Fields omitted from this cycle's record
    pub omitted: Vec<DashboardError>,
}

pub struct DashboardController {
    registry: FieldRegistry,
    layout: LayoutConfig,
    snapshots: SnapshotStore,
    history: DerivedHistory,
    display: BTreeMap<String, String>,
    // associated on the first successful cycle
    graphs: Option<Vec<GraphState>>,
    fetch_warning: Option<String>,
}

impl DashboardController {
    /// Every field the layout names must exist in the registry, charted ones with a chart spec.
    pub fn create(registry: FieldRegistry, layout: LayoutConfig) -> Result<Self, DashboardError> {
        for name in &layout.outputs {
            registry.lookup(name)?;
        }
        for target in &layout.charts {
            if registry.lookup(&target.field)?.chart.is_none() {
                return Err(DashboardError::NotChartable(target.field.clone()));
            }
        }

        Ok(Self {
            registry,
            layout,
            snapshots: SnapshotStore::new(),
            history: DerivedHistory::new(),
            display: BTreeMap::new(),
            graphs: None,
            fetch_warning: None,
        })
    }

    /// Store a fetched snapshot, derive its record and refresh every output.
    pub fn ingest(&mut self, snapshot: Snapshot) -> Result<CycleReport, DashboardError> {
        self.snapshots.push(snapshot);
        self.fetch_warning = None;

        let derivation = derive(&self.snapshots, &self.registry)?;
        for failure in &derivation.failures {
            tracing::error!("Skipping field update: {}", failure);
        }
        self.history.push(derivation.record);

        self.update_fields()?;
        if self.graphs.is_none() {
            self.graphs = Some(self.associate_graphs()?);
        }
        self.update_graphs();

        Ok(CycleReport {
            cycle: self.history.len(),
            omitted: derivation.failures,
        })
    }

    fn update_fields(&mut self) -> Result<(), DashboardError> {
        let latest = self.history.latest_record()?;
        for name in &self.layout.outputs {
            // an omitted field keeps showing its previous value
            if let Some(field) = latest.get(name) {
                self.display.insert(name.clone(), field.display(&self.registry)?);
            }
        }
        Ok(())
    }

    fn associate_graphs(&self) -> Result<Vec<GraphState>, DashboardError> {
        let record = self.history.latest_record()?;
        let mut graphs = Vec::with_capacity(self.layout.charts.len());

        for target in &self.layout.charts {
            let definition = self.registry.lookup(&target.field)?;
            let spec = definition
                .chart
                .as_ref()
                .ok_or_else(|| DashboardError::NotChartable(target.field.clone()))?;

            let graph = build_graph(
                ChartTarget::new(&target.field, target.width, target.height),
                definition,
                spec,
                record,
            );
            tracing::debug!("Associated chart for {}", target.field);
            graphs.push(graph);
        }

        Ok(graphs)
    }

    fn update_graphs(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let Some(graphs) = self.graphs.as_mut() else {
            return;
        };

        for graph in graphs.iter_mut() {
            let field = graph.target().field.clone();
            let values = match self.history.recent_values(&field, WINDOW_SIZE) {
                Ok(values) => values,
                Err(e) => {
                    tracing::debug!("Chart {} not updated: {}", field, e);
                    continue;
                }
            };
            let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();

            match self.registry.lookup(&field) {
                Ok(definition) => {
                    let formatter = &definition.format;
                    graph.update(&numbers, |v| formatter.format_number(v));
                }
                Err(e) => tracing::error!("Chart {} not updated: {}", field, e),
            }
        }
    }

    /// Formatted value of every scalar output that has been rendered at least once.
    pub fn display(&self) -> &BTreeMap<String, String> {
        &self.display
    }

    /// Every recorded value of `field`, oldest first.
    pub fn value_list(&self, field: &str) -> Result<Vec<FieldValue>, DashboardError> {
        self.registry.lookup(field)?;
        self.history.value_list(field)
    }

    pub fn latest_record(&self) -> Result<&DerivedRecord, DashboardError> {
        self.history.latest_record()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// No snapshot has been ingested yet.
    pub fn is_waiting(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Record a failed fetch; shown until the next successful cycle.
    pub fn note_fetch_failure(&mut self, message: String) {
        self.fetch_warning = Some(message);
    }

    pub fn fetch_warning(&self) -> Option<&str> {
        self.fetch_warning.as_deref()
    }

    pub fn graphs(&self) -> impl Iterator<Item = &GraphState> {
        self.graphs.iter().flatten()
    }

    pub fn graph(&self, field: &str) -> Option<&GraphState> {
        self.graphs().find(|g| g.target().field == field)
    }

    /// SVG of a chart target, `None` until the first cycle has associated the charts.
    pub fn chart_svg(&self, field: &str) -> Result<Option<String>, DashboardError> {
        self.check_chart_target(field)?;
        Ok(self
            .graph(field)
            .and_then(|g| g.rendered())
            .map(|r| r.to_svg()))
    }

    /// Re-measure a chart target and redraw it from its current entries.
    pub fn resize_chart(
        &mut self,
        field: &str,
        width: f64,
        height: f64,
    ) -> Result<Option<String>, DashboardError> {
        self.check_chart_target(field)?;
        if let Some(target) = self.layout.charts.iter_mut().find(|t| t.field == field) {
            target.width = width;
            target.height = height;
        }

        let graph = self
            .graphs
            .as_mut()
            .and_then(|graphs| graphs.iter_mut().find(|g| g.target().field == field));
        Ok(graph.map(|g| g.resize(width, height).to_svg()))
    }

    /// Current `(width, height)` of a chart target.
    pub fn chart_dimensions(&self, field: &str) -> Result<(f64, f64), DashboardError> {
        self.layout
            .charts
            .iter()
            .find(|t| t.field == field)
            .map(|t| (t.width, t.height))
            .ok_or_else(|| DashboardError::FieldNotFound(field.to_string()))
    }

    fn check_chart_target(&self, field: &str) -> Result<(), DashboardError> {
        self.chart_dimensions(field).map(|_| ())
    }

    pub fn frame(&self) -> DashboardFrame {
        let charts = self
            .graphs()
            .filter_map(|g| {
                g.rendered()
                    .map(|r| (g.target().field.clone(), r.to_svg()))
            })
            .collect();

        DashboardFrame::new(
            self.history.len(),
            chrono::Utc::now().timestamp_millis(),
            self.display.clone(),
            charts,
        )
    }

    /// Drop every chart's state; the next ingested snapshot associates them again.
    pub fn teardown(&mut self) {
        if let Some(graphs) = self.graphs.take() {
            tracing::info!("Tearing down {} charts", graphs.len());
        }
    }
}

fn build_graph(
    target: ChartTarget,
    definition: &FieldDefinition,
    spec: &ChartSpec,
    record: &DerivedRecord,
) -> GraphState {
    let max = match (&spec.max_from, spec.max) {
        (Some(source), _) => match record.get(source).and_then(|f| f.value.as_f64()) {
            Some(max) => max,
            None => {
                tracing::error!(
                    "Chart {} takes its scale from {} which has no numeric value",
                    definition.name,
                    source
                );
                spec.max.unwrap_or(1.0)
            }
        },
        (None, Some(max)) => max,
        (None, None) => 1.0,
    };

    let mut graph = GraphState::create(target, spec.min, max);
    let style = &mut graph.style;
    style.value_text = spec.value_text;
    style.dots = spec.dots;
    if let Some(line_width) = spec.line_width {
        style.line_width = line_width;
    }
    if let Some(entry_width) = spec.entry_width {
        style.entry_width = entry_width;
    }
    if let Some(color) = &spec.line_color {
        style.line_color = color.clone();
    }
    if let Some(color) = &spec.under_color {
        style.under_color = color.clone();
    }
    if let Some(background) = &spec.background {
        style.background = background.clone();
    }

    for marker in &spec.markers {
        graph.push_marker(ReferenceMarker::new(&marker.label, marker.value));
    }
    for fraction in &spec.marker_fractions {
        let value = max * fraction;
        graph.push_marker(ReferenceMarker::new(
            definition.format.format_number(value),
            value,
        ));
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::GraphStyle;
    use crate::domain::snapshot::{Measurement, RawValue};
    use crate::infrastructure::config::{ChartTargetConfig, load_field_registry};

    fn layout() -> LayoutConfig {
        LayoutConfig {
            outputs: vec!["ram_used".to_string(), "cpu_usage_total".to_string()],
            charts: vec![ChartTargetConfig {
                field: "ram_used".to_string(),
                width: 400.0,
                height: 100.0,
            }],
        }
    }

    fn controller() -> DashboardController {
        DashboardController::create(load_field_registry(None).unwrap(), layout()).unwrap()
    }

    fn snapshot(timestamp: f64, ram_used: f64) -> Snapshot {
        Snapshot::from_measurements(vec![
            Measurement::new("timestamp", RawValue::Number(timestamp)),
            Measurement::new("ram_total", RawValue::Number(1000.0)),
            Measurement::new("ram_used", RawValue::Number(ram_used)),
        ])
        .unwrap()
    }

    #[test]
    fn test_two_cycles_update_display_and_chart() {
        let mut controller = controller();

        controller.ingest(snapshot(0.0, 250.0)).unwrap();
        assert_eq!(controller.display()["ram_used"], "250B");

        let report = controller.ingest(snapshot(0.5, 500.0)).unwrap();
        assert_eq!(report.cycle, 2);
        assert_eq!(controller.display()["ram_used"], "500B");

        let graph = controller.graph("ram_used").unwrap();
        assert_eq!(graph.entries(), &[250.0, 500.0]);
        assert_eq!(graph.scale(), (0.0, 1000.0));
        let labels: Vec<&str> = graph.markers().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["250B", "500B", "750B"]);
    }

    #[test]
    fn test_missing_fields_are_omitted_not_zeroed() {
        let mut controller = controller();
        let report = controller.ingest(snapshot(0.0, 250.0)).unwrap();

        // cpu usage needs no history on the first cycle, the rest of the registry is absent
        assert!(report.omitted.contains(&DashboardError::MissingField {
            field: "temp_cpu".to_string(),
            key: "temp_cpu".to_string(),
        }));
        assert_eq!(controller.display()["cpu_usage_total"], "0%");

        let partial = Snapshot::from_measurements(vec![Measurement::new(
            "timestamp",
            RawValue::Number(1.0),
        )])
        .unwrap();
        controller.ingest(partial).unwrap();

        assert_eq!(controller.display()["ram_used"], "250B");
        assert_eq!(controller.graph("ram_used").unwrap().entries(), &[250.0]);
        assert_eq!(controller.history_len(), 2);
    }

    #[test]
    fn test_unknown_layout_field_fails_loudly() {
        let mut bad = layout();
        bad.outputs.push("swap_used".to_string());
        let result = DashboardController::create(load_field_registry(None).unwrap(), bad);
        assert!(matches!(result, Err(DashboardError::UnknownField(name)) if name == "swap_used"));

        let mut not_chartable = layout();
        not_chartable.charts[0].field = "model".to_string();
        let result = DashboardController::create(load_field_registry(None).unwrap(), not_chartable);
        assert!(matches!(result, Err(DashboardError::NotChartable(_))));
    }

    #[test]
    fn test_resize_chart() {
        let mut controller = controller();
        assert_eq!(controller.resize_chart("ram_used", 200.0, 50.0), Ok(None));

        controller.ingest(snapshot(0.0, 500.0)).unwrap();
        let svg = controller.resize_chart("ram_used", 200.0, 50.0).unwrap().unwrap();
        assert!(svg.contains(r#"width="200" height="50""#));
        assert!(svg.contains(r#"<circle cx="200" cy="25""#));
        assert_eq!(controller.chart_svg("ram_used").unwrap(), Some(svg));

        assert_eq!(
            controller.resize_chart("cpu_usage_total", 1.0, 1.0),
            Err(DashboardError::FieldNotFound("cpu_usage_total".to_string()))
        );
    }

    #[test]
    fn test_chart_window_after_long_uptime() {
        let mut controller = controller();
        for i in 0..150 {
            controller.ingest(snapshot(i as f64 * 0.5, i as f64)).unwrap();
        }

        let entries = controller.graph("ram_used").unwrap().entries();
        assert_eq!(entries.len(), WINDOW_SIZE);
        assert_eq!(entries.first(), Some(&50.0));
        assert_eq!(entries.last(), Some(&149.0));
        assert_eq!(controller.value_list("ram_used").unwrap().len(), 150);
        assert_eq!(
            controller.value_list("swap_used"),
            Err(DashboardError::UnknownField("swap_used".to_string()))
        );
    }

    #[test]
    fn test_chart_style_from_registry() {
        let spec = ChartSpec {
            min: 0.0,
            max: Some(10.0),
            max_from: None,
            markers: Vec::new(),
            marker_fractions: Vec::new(),
            value_text: false,
            dots: true,
            line_width: Some(1.0),
            entry_width: Some(5.0),
            line_color: Some("#e05050".to_string()),
            under_color: None,
            background: Some("white".to_string()),
        };
        let definition = load_field_registry(None)
            .unwrap()
            .lookup("temp_cpu")
            .unwrap()
            .clone();

        let mut graph = build_graph(
            ChartTarget::new("temp_cpu", 100.0, 10.0),
            &definition,
            &spec,
            &DerivedRecord::default(),
        );
        assert_eq!(graph.style.line_width, 1.0);
        assert_eq!(graph.style.under_color, GraphStyle::default().under_color);

        let svg = graph.update(&[5.0, 5.0], |v| v.to_string()).to_svg();
        assert!(svg.contains("stroke-width: 1px; background: white"));
        assert!(svg.contains(r#"<circle cx="95" cy="5" r="1" style="fill: #e05050" />"#));
    }

    #[test]
    fn test_frame_and_teardown() {
        let mut controller = controller();
        controller.ingest(snapshot(0.0, 250.0)).unwrap();

        let frame = controller.frame();
        assert_eq!(frame.cycle, 1);
        assert_eq!(frame.fields["ram_used"], "250B");
        assert!(frame.charts["ram_used"].starts_with("<svg"));

        controller.teardown();
        assert!(controller.graph("ram_used").is_none());
        assert!(controller.frame().charts.is_empty());

        controller.ingest(snapshot(0.5, 300.0)).unwrap();
        assert_eq!(controller.graph("ram_used").unwrap().entries(), &[250.0, 300.0]);
    }
}
