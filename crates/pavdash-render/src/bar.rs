//! Actual vs planned grouped bar chart

use pavdash_core::reshape::{Category, PeriodSummaryTable, SummaryBar};
use pavdash_core::{Activity, ProjectId, RenderError, Renderer};
use svg::node::element::{Group, Rectangle};

use crate::chart::{
    canvas, format_value, legend, placeholder, tooltip, truncate, value_axis, write_document,
    ChartTheme, PlotArea, ValueScale, LEGEND_ROW_HEIGHT,
};

/// Title of the comparison chart
pub const SUMMARY_CHART_TITLE: &str = "Comparação de Produção Acumulada vs. Prevista";

/// SVG grouped bar chart: activities on the x axis, one bar per
/// (project, category) series in each group
#[derive(Clone, Debug)]
pub struct BarChartRenderer {
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
    /// Share of each activity slot covered by bars (0..1)
    pub group_fill: f64,
    pub theme: ChartTheme,
}

impl Default for BarChartRenderer {
    fn default() -> Self {
        Self {
            chart_width: 760,
            chart_height: 320,
            legend_width: 240,
            padding: 20,
            axis_width: 50,
            title: SUMMARY_CHART_TITLE.into(),
            group_fill: 0.8,
            theme: ChartTheme::default(),
        }
    }
}

/// A colored set of bars: one project's actual or planned figures
#[derive(Clone, Debug, PartialEq, Eq)]
struct BarSeries<'a> {
    project: &'a ProjectId,
    category: Category,
}

impl BarSeries<'_> {
    fn label(&self, multi_project: bool) -> String {
        if multi_project {
            format!("{} - {}", self.project.label(), self.category.label())
        } else {
            self.category.label().to_string()
        }
    }
}

impl BarChartRenderer {
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

    pub fn dark_theme(mut self) -> Self {
        self.theme = ChartTheme::dark();
        self
    }

    fn total_width(&self) -> u32 {
        self.padding * 3 + self.axis_width + self.chart_width + self.legend_width
    }

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

    /// Activity labels centered under each group
    fn render_categories(&self, groups: &[(Activity, &str)], area: PlotArea) -> Group {
        let mut group = Group::new().set("class", "x-axis");
        let slot = area.width / groups.len() as f64;
        for (i, (_, label)) in groups.iter().enumerate() {
            let x = area.left + slot * (i as f64 + 0.5);
            let text = self
                .theme
                .text(truncate(label, 18), x, area.bottom() + 18.0, self.theme.font_size - 1)
                .set("text-anchor", "middle");
            group = group.add(text);
        }
        group
    }

    fn render_bar(
        &self,
        bar: &SummaryBar,
        value: f64,
        x: f64,
        width: f64,
        color: &str,
        scale: &ValueScale,
        area: PlotArea,
    ) -> Rectangle {
        let zero = scale.y(0.0, area.top, area.height);
        let top = scale.y(value, area.top, area.height);
        let (y, height) = if top <= zero {
            (top, zero - top)
        } else {
            (zero, top - zero)
        };

        Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", width)
            .set("height", height.max(0.5))
            .set("fill", color)
            .add(tooltip(format!(
                "{} | {} | {}: {}",
                bar.project.label(),
                bar.activity_label,
                bar.category.label(),
                format_value(value)
            )))
    }
}

/// Space for the title and month subtitle above the plot
const HEADER_HEIGHT: u32 = 48;
/// Space for the activity labels below the plot
const X_AXIS_HEIGHT: u32 = 30;

/// Activities in first-appearance order
fn activity_groups(table: &PeriodSummaryTable) -> Vec<(Activity, &str)> {
    let mut groups: Vec<(Activity, &str)> = Vec::new();
    for bar in &table.bars {
        if !groups.iter().any(|(activity, _)| *activity == bar.activity) {
            groups.push((bar.activity, bar.activity_label.as_str()));
        }
    }
    groups.sort_by_key(|(activity, _)| *activity);
    groups
}

/// Series in project order, actual before planned
fn bar_series(table: &PeriodSummaryTable) -> Vec<BarSeries<'_>> {
    let mut series = Vec::new();
    for project in table.projects() {
        for category in Category::ALL {
            if table
                .bars
                .iter()
                .any(|b| &b.project == project && b.category == category)
            {
                series.push(BarSeries { project, category });
            }
        }
    }
    series
}

impl Renderer<PeriodSummaryTable> for BarChartRenderer {
    type Output = String;

    fn render(&self, table: &PeriodSummaryTable) -> Result<String, RenderError> {
        let series = bar_series(table);
        let width = self.total_width();
        let height = self.total_height(series.len());

        let groups = activity_groups(table);
        if groups.is_empty() {
            let document = placeholder(width, height, &self.title, &self.theme, self.padding);
            return write_document(&document);
        }

        let area = self.plot_area();
        let scale = ValueScale::covering(table.bars.iter().filter_map(|b| b.value));
        let multi_project = table.projects().len() > 1;

        let mut document = canvas(width, height, &self.title, &self.theme, self.padding)
            .add(value_axis(&scale, area, &self.theme))
            .add(self.render_categories(&groups, area));

        if let Some(month) = table.month {
            let subtitle = self
                .theme
                .text(
                    month.to_string(),
                    f64::from(self.padding),
                    f64::from(self.padding) + 36.0,
                    self.theme.font_size,
                )
                .set("fill", self.theme.muted_text_color.as_str());
            document = document.add(subtitle);
        }

        let slot = area.width / groups.len() as f64;
        let bar_width = slot * self.group_fill.clamp(0.1, 1.0) / series.len().max(1) as f64;
        let mut bars = Group::new().set("class", "bars");
        for (g, (activity, _)) in groups.iter().enumerate() {
            let group_left = area.left + slot * g as f64 + (slot - bar_width * series.len() as f64) / 2.0;
            for (s, entry) in series.iter().enumerate() {
                let Some(bar) = table.bar(entry.project, *activity, entry.category) else {
                    continue;
                };
                let Some(value) = bar.value else {
                    continue;
                };
                let x = group_left + bar_width * s as f64;
                bars = bars.add(self.render_bar(
                    bar,
                    value,
                    x,
                    bar_width,
                    self.theme.series_color(s),
                    &scale,
                    area,
                ));
            }
        }
        document = document.add(bars);

        let entries: Vec<(String, String)> = series
            .iter()
            .enumerate()
            .map(|(s, entry)| {
                (
                    entry.label(multi_project),
                    self.theme.series_color(s).to_string(),
                )
            })
            .collect();
        let legend_x = area.right() + f64::from(self.padding);
        document = document.add(legend(&entries, legend_x, area.top + 10.0, &self.theme));

        write_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pavdash_core::Month;

    fn bars_for(project: &str, actual: [Option<f64>; 5], planned: [Option<f64>; 5]) -> Vec<SummaryBar> {
        let mut bars = Vec::new();
        for (category, values) in [(Category::Actual, actual), (Category::Planned, planned)] {
            for (i, value) in values.into_iter().enumerate() {
                let activity = Activity::new(i as u8 + 1).unwrap();
                bars.push(SummaryBar {
                    project: ProjectId::from(project),
                    month: Month::new(2024, 3).unwrap(),
                    date: NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
                    activity,
                    activity_label: format!("Atividade {}", i + 1),
                    category,
                    value,
                });
            }
        }
        bars
    }

    fn table(bars: Vec<SummaryBar>) -> PeriodSummaryTable {
        PeriodSummaryTable {
            month: Some(Month::new(2024, 3).unwrap()),
            bars,
        }
    }

    #[test]
    fn one_bar_per_present_value() {
        let t = table(bars_for(
            "1",
            [Some(100.0), Some(50.0), None, Some(0.0), Some(10.0)],
            [Some(120.0), Some(60.0), Some(30.0), Some(5.0), None],
        ));
        let svg = BarChartRenderer::new().render(&t).unwrap();
        // background + 2 legend swatches + 8 bars
        assert_eq!(svg.matches("<rect").count(), 1 + 2 + 8);
        assert!(svg.contains("Realizado Acumulado"));
        assert!(svg.contains("Produção Prevista"));
        assert!(svg.contains("2024-03"));
    }

    #[test]
    fn series_per_project_and_category() {
        let mut bars = bars_for("1", [Some(1.0); 5], [Some(2.0); 5]);
        bars.extend(bars_for("2", [Some(3.0); 5], [Some(4.0); 5]));
        let t = table(bars);

        let series = bar_series(&t);
        let labels: Vec<String> = series.iter().map(|s| s.label(true)).collect();
        assert_eq!(
            labels,
            vec![
                "Obra 1 - Realizado Acumulado",
                "Obra 1 - Produção Prevista",
                "Obra 2 - Realizado Acumulado",
                "Obra 2 - Produção Prevista",
            ]
        );
        assert_eq!(activity_groups(&t).len(), 5);
    }

    #[test]
    fn single_project_labels_are_plain() {
        let t = table(bars_for("7", [Some(1.0); 5], [Some(2.0); 5]));
        let series = bar_series(&t);
        assert_eq!(series[0].label(false), "Realizado Acumulado");
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let svg = BarChartRenderer::new()
            .render(&PeriodSummaryTable::default())
            .unwrap();
        assert!(svg.contains("Sem dados"));
        assert!(svg.contains(SUMMARY_CHART_TITLE));
    }
}
