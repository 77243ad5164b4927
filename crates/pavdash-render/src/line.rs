//! Daily production line chart

use chrono::NaiveDate;
use pavdash_core::reshape::{DailyPoint, DailySeriesTable};
use pavdash_core::{RenderError, Renderer};
use svg::node::element::{Circle, Group, Line, Polyline};

use crate::chart::{
    canvas, legend, placeholder, tooltip, value_axis, write_document, ChartTheme, PlotArea,
    ValueScale, LEGEND_ROW_HEIGHT,
};

/// Title of the daily production chart
pub const DAILY_CHART_TITLE: &str = "Produção Diária por Atividade e Obra";

/// SVG line chart of daily production, one line per series
#[derive(Clone, Debug)]
pub struct LineChartRenderer {
    /// Width of the plot area in pixels
    pub chart_width: u32,
    /// Height of the plot area in pixels
    pub chart_height: u32,
    /// Width of the legend column in pixels
    pub legend_width: u32,
    /// Padding around the chart
    pub padding: u32,
    /// Space for the value labels left of the plot
    pub axis_width: u32,
    pub title: String,
    /// Draw a marker on every data point
    pub markers: bool,
    pub theme: ChartTheme,
}

impl Default for LineChartRenderer {
    fn default() -> Self {
        Self {
            chart_width: 760,
            chart_height: 320,
            legend_width: 240,
            padding: 20,
            axis_width: 50,
            title: DAILY_CHART_TITLE.into(),
            markers: true,
            theme: ChartTheme::default(),
        }
    }
}

impl LineChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    pub fn chart_height(mut self, height: u32) -> Self {
        self.chart_height = height;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn without_markers(mut self) -> Self {
        self.markers = false;
        self
    }

    pub fn dark_theme(mut self) -> Self {
        self.theme = ChartTheme::dark();
        self
    }

    fn total_width(&self) -> u32 {
        self.padding * 3 + self.axis_width + self.chart_width + self.legend_width
    }

    /// Grows with the legend when there are more series than fit beside the plot
    fn total_height(&self, series_count: usize) -> u32 {
        let legend = (series_count as f64 * LEGEND_ROW_HEIGHT).ceil() as u32;
        self.padding * 2 + HEADER_HEIGHT + self.chart_height.max(legend) + X_AXIS_HEIGHT
    }

    fn plot_area(&self) -> PlotArea {
        PlotArea {
            left: f64::from(self.padding + self.axis_width),
            top: f64::from(self.padding + HEADER_HEIGHT),
            width: f64::from(self.chart_width),
            height: f64::from(self.chart_height),
        }
    }

    /// Date labels and ticks along the bottom edge
    fn render_date_axis(&self, axis: &DateAxis, area: PlotArea) -> Group {
        let mut group = Group::new().set("class", "x-axis");

        let total_days = axis.days();
        let interval = if total_days <= 14 {
            1
        } else if total_days <= 60 {
            7
        } else {
            14
        };

        let mut current = axis.start;
        while current <= axis.end {
            let x = axis.x(current, area);
            let tick = Line::new()
                .set("x1", x)
                .set("y1", area.bottom())
                .set("x2", x)
                .set("y2", area.bottom() + 5.0)
                .set("stroke", self.theme.axis_color.as_str())
                .set("stroke-width", 1);
            group = group.add(tick);

            let label = self
                .theme
                .text(
                    current.format("%d/%m").to_string(),
                    x,
                    area.bottom() + 18.0,
                    self.theme.font_size - 1,
                )
                .set("text-anchor", "middle")
                .set("fill", self.theme.muted_text_color.as_str());
            group = group.add(label);

            match current.checked_add_days(chrono::Days::new(interval)) {
                Some(next) => current = next,
                None => break,
            }
        }

        group
    }

    /// One series: a polyline per run of consecutive values, gaps left open
    fn render_series(
        &self,
        key: &str,
        points: &[&DailyPoint],
        color: &str,
        axis: &DateAxis,
        scale: &ValueScale,
        area: PlotArea,
    ) -> Group {
        let mut group = Group::new().set("class", "series").set("data-series", key);

        for run in runs(points) {
            let coords: Vec<(f64, f64)> = run
                .iter()
                .map(|(date, value)| (axis.x(*date, area), scale.y(*value, area.top, area.height)))
                .collect();

            if coords.len() > 1 {
                let path = coords
                    .iter()
                    .map(|(x, y)| format!("{:.1},{:.1}", x, y))
                    .collect::<Vec<_>>()
                    .join(" ");
                let line = Polyline::new()
                    .set("points", path)
                    .set("fill", "none")
                    .set("stroke", color)
                    .set("stroke-width", 2)
                    .set("stroke-linejoin", "round");
                group = group.add(line);
            }

            // A lone value between gaps is only visible as a marker
            if self.markers || coords.len() == 1 {
                for ((date, value), (x, y)) in run.iter().zip(&coords) {
                    let marker = Circle::new()
                        .set("cx", *x)
                        .set("cy", *y)
                        .set("r", 3)
                        .set("fill", color)
                        .add(tooltip(format!(
                            "{} | {}: {}",
                            key,
                            date.format("%d/%m/%Y"),
                            crate::chart::format_value(*value)
                        )));
                    group = group.add(marker);
                }
            }
        }

        group
    }
}

/// Space for the title above the plot
const HEADER_HEIGHT: u32 = 40;
/// Space for the date labels below the plot
const X_AXIS_HEIGHT: u32 = 30;

/// Split a date-ordered series into runs of present values
fn runs(points: &[&DailyPoint]) -> Vec<Vec<(NaiveDate, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for point in points {
        match point.value {
            Some(value) if value.is_finite() => current.push((point.date, value)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Horizontal date scale
struct DateAxis {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateAxis {
    fn days(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days()).unwrap_or(0)
    }

    fn x(&self, date: NaiveDate, area: PlotArea) -> f64 {
        let days = self.days();
        if days == 0 {
            return area.left + area.width / 2.0;
        }
        let offset = (date - self.start).num_days() as f64;
        area.left + offset / days as f64 * area.width
    }
}

impl Renderer<DailySeriesTable> for LineChartRenderer {
    type Output = String;

    fn render(&self, table: &DailySeriesTable) -> Result<String, RenderError> {
        let keys = table.series_keys();
        let width = self.total_width();
        let height = self.total_height(keys.len());

        let Some((start, end)) = table.date_range() else {
            let document = placeholder(width, height, &self.title, &self.theme, self.padding);
            return write_document(&document);
        };

        let area = self.plot_area();
        let axis = DateAxis { start, end };
        let scale = ValueScale::covering(table.points.iter().filter_map(|p| p.value));

        let mut document = canvas(width, height, &self.title, &self.theme, self.padding)
            .add(value_axis(&scale, area, &self.theme))
            .add(self.render_date_axis(&axis, area));

        let mut entries = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let color = self.theme.series_color(index).to_string();
            let points = table.series(key);
            document = document.add(self.render_series(key, &points, &color, &axis, &scale, area));
            entries.push((key.clone(), color));
        }

        let legend_x = area.right() + f64::from(self.padding);
        document = document.add(legend(&entries, legend_x, area.top + 10.0, &self.theme));

        write_document(&document)
    }
}
