// Chart rendering - sliding window of values mapped to an SVG line chart
use super::error::DashboardError;
use serde::Serialize;
use std::fmt::Write;

/// Most recent entries kept on a chart.
pub const WINDOW_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceMarker {
    pub label: String,
    pub value: f64,
}

impl ReferenceMarker {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphStyle {
    /// Horizontal spacing between entries (px)
    pub entry_width: f64,
    pub line_width: f64,
    /// Double the point marker radius
    pub dots: bool,
    pub line_color: String,
    /// Fill under the line; "transparent" still renders the path
    pub under_color: String,
    pub background: String,
    /// Bold label with the latest value at the right edge
    pub value_text: bool,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            entry_width: 10.0,
            line_width: 3.0,
            dots: false,
            line_color: "rgb(139, 140, 224)".to_string(),
            under_color: "rgba(139, 140, 224, 0.3)".to_string(),
            background: "#f3f3f3".to_string(),
            value_text: false,
        }
    }
}

/// The output node a chart draws into, with its current pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTarget {
    pub field: String,
    pub width: f64,
    pub height: f64,
}

impl ChartTarget {
    pub fn new(field: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            field: field.into(),
            width,
            height,
        }
    }
}

/// SVG fragments of one render, one per drawing layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub width: f64,
    pub height: f64,
    pub lines: String,
    pub lines_under: String,
    pub markers: String,
    pub value_display: String,
    line_width: f64,
    background: String,
}

impl RenderedChart {
    pub fn to_svg(&self) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" class="graph_object" "#,
                r#"width="{}" height="{}" style="stroke-width: {}px; background: {}">"#,
                r#"<g class="graph_lines">{}</g>"#,
                r#"<g class="graph_lines_under">{}</g>"#,
                r#"<g class="graph_markers">{}</g>"#,
                r#"<g class="graph_value_display">{}</g>"#,
                "</svg>"
            ),
            self.width,
            self.height,
            self.line_width,
            escape(&self.background),
            self.lines,
            self.lines_under,
            self.markers,
            self.value_display,
        )
    }
}

#[derive(Debug)]
pub struct GraphState {
    target: ChartTarget,
    min: f64,
    max: f64,
    markers: Vec<ReferenceMarker>,
    pub style: GraphStyle,
    config_error: Option<DashboardError>,
    entries: Vec<f64>,
    latest_label: Option<String>,
    rendered: Option<RenderedChart>,
}

impl GraphState {
    /// Associate a chart with `target`. An inverted or empty scale is reported
    /// but still yields a state that renders (flat at the bottom edge).
    pub fn create(target: ChartTarget, min: f64, max: f64) -> Self {
        let config_error = if max > min {
            None
        } else {
            tracing::error!(
                "maximum and minimum values are invalid for chart {}: max={}, min={}",
                target.field,
                max,
                min
            );
            Some(DashboardError::InvalidScale { min, max })
        };

        Self {
            target,
            min,
            max,
            markers: Vec::new(),
            style: GraphStyle::default(),
            config_error,
            entries: Vec::new(),
            latest_label: None,
            rendered: None,
        }
    }

    pub fn target(&self) -> &ChartTarget {
        &self.target
    }

    pub fn scale(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn config_error(&self) -> Option<&DashboardError> {
        self.config_error.as_ref()
    }

    pub fn markers(&self) -> &[ReferenceMarker] {
        &self.markers
    }

    pub fn push_marker(&mut self, marker: ReferenceMarker) {
        self.markers.push(marker);
    }

    /// Entries currently drawn, oldest first.
    pub fn entries(&self) -> &[f64] {
        &self.entries
    }

    pub fn rendered(&self) -> Option<&RenderedChart> {
        self.rendered.as_ref()
    }

    /// Replace the chart's entries with the last `WINDOW_SIZE` of `values` and redraw.
    pub fn update<F>(&mut self, values: &[f64], display: F) -> &RenderedChart
    where
        F: Fn(f64) -> String,
    {
        let start = values.len().saturating_sub(WINDOW_SIZE);
        self.entries = values[start..].to_vec();
        self.latest_label = self.entries.last().map(|v| display(*v));
        self.render()
    }

    /// New dimensions for the target; the chart is redrawn at the new size.
    pub fn resize(&mut self, width: f64, height: f64) -> &RenderedChart {
        self.target.width = width;
        self.target.height = height;
        self.render()
    }

    pub fn render(&mut self) -> &RenderedChart {
        let rendered = RenderedChart {
            width: self.target.width,
            height: self.target.height,
            lines: self.render_lines(),
            lines_under: self.render_lines_under(),
            markers: self.render_markers(),
            value_display: self.render_value_display(),
            line_width: self.style.line_width,
            background: self.style.background.clone(),
        };
        self.rendered.insert(rendered)
    }

    fn x_at(&self, index: usize) -> f64 {
        let count = self.entries.len();
        self.target.width - self.style.entry_width * (count - index - 1) as f64
    }

    fn y_for(&self, value: f64) -> f64 {
        let h = self.target.height;
        let span = self.max - self.min;
        if span > 0.0 {
            h - (value - self.min) / span * h
        } else {
            h
        }
    }

    /// Path from the left edge along the bottom, then through every entry.
    fn line_path(&self) -> String {
        let (w, h) = (self.target.width, self.target.height);
        let start_x = w - self.entries.len() as f64 * self.style.entry_width;
        let mut d = format!("M 0 {} L {} {} ", h, start_x, h);
        for (i, value) in self.entries.iter().enumerate() {
            let _ = write!(d, "L {} {} ", self.x_at(i), self.y_for(*value));
        }
        d
    }

    fn render_lines(&self) -> String {
        let mut radius = self.style.line_width * 0.5;
        if self.style.dots {
            radius *= 2.0;
        }

        let color = escape(&self.style.line_color);
        let mut out = String::new();
        for (i, value) in self.entries.iter().enumerate() {
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}" style="fill: {}" />"#,
                self.x_at(i),
                self.y_for(*value),
                radius,
                color
            );
        }
        let _ = write!(
            out,
            r#"<path d="{}" style="stroke: {}; stroke-width: {}; fill: none" />"#,
            self.line_path(),
            color,
            self.style.line_width
        );
        out
    }

    fn render_lines_under(&self) -> String {
        let (w, h) = (self.target.width, self.target.height);
        let d = format!("{}L {} {} Z", self.line_path(), w, h);
        format!(
            r#"<path d="{}" style="stroke: transparent; fill: {}" />"#,
            d,
            escape(&self.style.under_color)
        )
    }

    fn marker_y(&self, value: f64) -> f64 {
        let h = self.target.height;
        if self.max != 0.0 {
            h - value / self.max * h
        } else {
            h
        }
    }

    fn render_markers(&self) -> String {
        let w = self.target.width;
        let half_line = self.style.line_width * 0.5;
        let mut out = String::new();
        for marker in &self.markers {
            let y = self.marker_y(marker.value);
            let _ = write!(
                out,
                r##"<path d="M 0 {y} L {w} {y}" style="stroke: #ccc; fill: none; stroke-width: {half_line}" />"##
            );
            let _ = write!(
                out,
                r##"<text x="3" y="{}" style="fill: #aaa; font-size: 12px; font-family: sans-serif">{}</text>"##,
                y - half_line - 3.0,
                escape(&marker.label)
            );
        }
        out
    }

    fn render_value_display(&self) -> String {
        if !self.style.value_text {
            return String::new();
        }
        let (Some(latest), Some(label)) = (self.entries.last(), self.latest_label.as_ref()) else {
            return String::new();
        };

        format!(
            concat!(
                r#"<text x="{}" y="{}" style="fill: {}; font-size: 14px; "#,
                r#"font-family: sans-serif; font-weight: bold" text-anchor="end">{}</text>"#
            ),
            self.target.width - 3.0,
            self.y_for(*latest) - self.style.line_width - 3.0,
            escape(&self.style.line_color),
            escape(label)
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
