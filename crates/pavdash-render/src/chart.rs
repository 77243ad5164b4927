//! Building blocks shared by the chart renderers

use pavdash_core::RenderError;
use svg::node::element::{Element, Group, Line, Rectangle, Text};
use svg::{Document, Node};

/// Colors and fonts of a chart
#[derive(Clone, Debug)]
pub struct ChartTheme {
    pub background_color: String,
    pub grid_color: String,
    pub axis_color: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub font_family: String,
    pub font_size: u32,
    /// Series colors, reused cyclically
    pub palette: Vec<String>,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl ChartTheme {
    pub fn light() -> Self {
        Self {
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            axis_color: "#95a5a6".into(),
            text_color: "#2c3e50".into(),
            muted_text_color: "#7f8c8d".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
            palette: [
                "#3498db", "#e67e22", "#2ecc71", "#e74c3c", "#9b59b6", "#1abc9c", "#f1c40f",
                "#34495e", "#d35400", "#7f8c8d",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background_color: "#1a1a2e".into(),
            grid_color: "#2d2d44".into(),
            axis_color: "#95a5a6".into(),
            text_color: "#eaeaea".into(),
            muted_text_color: "#a0a0b0".into(),
            ..Self::light()
        }
    }

    /// Color of the n-th series
    pub fn series_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return self.text_color.as_str();
        }
        self.palette[index % self.palette.len()].as_str()
    }

    pub(crate) fn text(&self, content: impl Into<String>, x: f64, y: f64, size: u32) -> Text {
        Text::new(content.into())
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", size)
            .set("fill", self.text_color.as_str())
    }
}

// ============================================================================
// Value axis
// ============================================================================

/// Linear value scale with round tick values
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ValueScale {
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<f64>,
}

impl ValueScale {
    /// Scale covering zero and every value in `values`
    pub fn covering(values: impl IntoIterator<Item = f64>) -> Self {
        let (mut lo, mut hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if (hi - lo).abs() < f64::EPSILON {
            hi = lo + 1.0;
        }

        let step = nice_step((hi - lo) / 5.0);
        lo = (lo / step).floor() * step;
        hi = (hi / step).ceil() * step;

        let count = ((hi - lo) / step).round() as usize;
        let ticks = (0..=count).map(|i| lo + step * i as f64).collect();
        Self {
            min: lo,
            max: hi,
            ticks,
        }
    }

    /// Vertical pixel position of `value` in a plot spanning `top..top + height`
    pub fn y(&self, value: f64, top: f64, height: f64) -> f64 {
        let span = self.max - self.min;
        top + height - (value - self.min) / span * height
    }
}

/// Round step size (1, 2, 2.5 or 5 times a power of ten) at least `raw`
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let factor = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|f| *f >= normalized - 1e-9)
        .unwrap_or(10.0);
    factor * magnitude
}

/// Axis and tooltip number format
pub(crate) fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else if value.abs() < 10.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.1}", value)
    }
}

// ============================================================================
// Shared SVG pieces
// ============================================================================

/// Plot rectangle inside the document
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Horizontal grid lines with value labels on the left
pub(crate) fn value_axis(scale: &ValueScale, area: PlotArea, theme: &ChartTheme) -> Group {
    let mut group = Group::new().set("class", "y-axis");
    for &tick in &scale.ticks {
        let y = scale.y(tick, area.top, area.height);
        let line = Line::new()
            .set("x1", area.left)
            .set("y1", y)
            .set("x2", area.right())
            .set("y2", y)
            .set("stroke", theme.grid_color.as_str())
            .set("stroke-width", 1);
        group = group.add(line);

        let label = theme
            .text(format_value(tick), area.left - 8.0, y + 4.0, theme.font_size - 1)
            .set("text-anchor", "end")
            .set("fill", theme.muted_text_color.as_str());
        group = group.add(label);
    }

    let baseline = Line::new()
        .set("x1", area.left)
        .set("y1", area.bottom())
        .set("x2", area.right())
        .set("y2", area.bottom())
        .set("stroke", theme.axis_color.as_str())
        .set("stroke-width", 1);
    group.add(baseline)
}

/// Legend column: one colored swatch and label per entry
pub(crate) fn legend(entries: &[(String, String)], x: f64, y: f64, theme: &ChartTheme) -> Group {
    let mut group = Group::new().set("class", "legend");
    let box_size = 12.0;
    for (i, (label, color)) in entries.iter().enumerate() {
        let row_y = y + i as f64 * LEGEND_ROW_HEIGHT;
        let swatch = Rectangle::new()
            .set("x", x)
            .set("y", row_y - box_size + 2.0)
            .set("width", box_size)
            .set("height", box_size)
            .set("rx", 2)
            .set("fill", color.as_str());
        group = group.add(swatch);

        let text = theme.text(truncate(label, 34), x + box_size + 6.0, row_y, theme.font_size - 1);
        group = group.add(text);
    }
    group
}

/// Vertical space taken by one legend entry
pub(crate) const LEGEND_ROW_HEIGHT: f64 = 18.0;

/// Hover tooltip attached to a shape
pub(crate) fn tooltip(content: String) -> Element {
    let mut title = Element::new("title");
    title.append(svg::node::Text::new(content));
    title
}

/// Empty document with background and title
pub(crate) fn canvas(width: u32, height: u32, title: &str, theme: &ChartTheme, padding: u32) -> Document {
    let background = Rectangle::new()
        .set("width", "100%")
        .set("height", "100%")
        .set("fill", theme.background_color.as_str());
    let heading = theme
        .text(title, f64::from(padding), f64::from(padding) + 16.0, theme.font_size + 4)
        .set("font-weight", "bold");

    Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width, height))
        .set("xmlns", "http://www.w3.org/2000/svg")
        .add(background)
        .add(heading)
}

/// Chart with nothing to plot: title plus a centered "Sem dados" note
pub(crate) fn placeholder(width: u32, height: u32, title: &str, theme: &ChartTheme, padding: u32) -> Document {
    let note = theme
        .text("Sem dados", f64::from(width) / 2.0, f64::from(height) / 2.0, theme.font_size + 2)
        .set("text-anchor", "middle")
        .set("class", "no-data")
        .set("fill", theme.muted_text_color.as_str());
    canvas(width, height, title, theme, padding).add(note)
}

/// Serialize a document to an SVG string
pub(crate) fn write_document(document: &Document) -> Result<String, RenderError> {
    let mut output = Vec::new();
    svg::write(&mut output, document)
        .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;
    String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
}

/// Truncate a string with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!(
            "{}…",
            s.chars().take(max.saturating_sub(1)).collect::<String>()
        )
    }
}
