//! Standalone HTML dashboard
//!
//! One page with the four selectors and both charts inlined as SVG. The
//! selectors sit in a plain GET form that resubmits on change, so every
//! interaction is a fresh request carrying the whole selection in the query
//! string.

use pavdash_core::options::{SelectOption, SelectorOptions};
use pavdash_core::reshape::{DailySeriesTable, PeriodSummaryTable};
use pavdash_core::{RenderError, Renderer, Selection};

use crate::{BarChartRenderer, ChartTheme, LineChartRenderer};

/// Heading of the dashboard page
pub const DASHBOARD_TITLE: &str = "Produção Obras de Pavimentação";

/// Everything shown on one dashboard page
#[derive(Clone, Copy, Debug)]
pub struct DashboardView<'a> {
    pub options: &'a SelectorOptions,
    pub selection: &'a Selection,
    pub daily: &'a DailySeriesTable,
    pub summary: &'a PeriodSummaryTable,
}

/// HTML page renderer
#[derive(Clone, Debug)]
pub struct DashboardPage {
    pub title: String,
    /// Form target; the page resubmits its selectors here
    pub action: String,
    pub line: LineChartRenderer,
    pub bar: BarChartRenderer,
    pub theme: ChartTheme,
}

impl Default for DashboardPage {
    fn default() -> Self {
        Self {
            title: DASHBOARD_TITLE.into(),
            action: "/".into(),
            line: LineChartRenderer::default(),
            bar: BarChartRenderer::default(),
            theme: ChartTheme::default(),
        }
    }
}

impl DashboardPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Use the dark palette for the page and both charts
    pub fn dark_theme(mut self) -> Self {
        self.theme = ChartTheme::dark();
        self.line = self.line.dark_theme();
        self.bar = self.bar.dark_theme();
        self
    }

    fn generate_html(&self, view: &DashboardView<'_>, daily_svg: &str, summary_svg: &str) -> String {
        let selection = view.selection;
        let month = selection.month.map(|m| m.to_string()).unwrap_or_default();

        let selectors = [
            select(
                "activity",
                "Atividade",
                &view.options.activity,
                &selection.activity.to_string(),
            ),
            select("month", "Mês", &view.options.month, &month),
            select(
                "project",
                "Obra",
                &view.options.project,
                &selection.project.to_string(),
            ),
            select(
                "week",
                "Semana",
                &view.options.week,
                &selection.week.to_string(),
            ),
        ]
        .join("\n");

        format!(
            r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <div class="dashboard">
        <h1>{title}</h1>
        <form class="selectors" method="get" action="{action}">
{selectors}
            <noscript><button type="submit">Aplicar</button></noscript>
        </form>
        <div class="chart" id="grafico-prod-diaria">
{daily_svg}
        </div>
        <div class="chart" id="grafico-comparativo-mensal">
{summary_svg}
        </div>
    </div>
</body>
</html>"#,
            title = html_escape(&self.title),
            css = self.generate_css(),
            action = html_escape(&self.action),
            selectors = selectors,
            daily_svg = daily_svg,
            summary_svg = summary_svg,
        )
    }

    fn generate_css(&self) -> String {
        format!(
            r#"        :root {{
            --bg-color: {bg};
            --text-color: {text};
            --muted-color: {muted};
            --border-color: {border};
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: {font};
            background: var(--bg-color);
            color: var(--text-color);
            padding: 20px;
        }}
        h1 {{
            font-size: 1.5rem;
            font-weight: 600;
            margin-bottom: 16px;
        }}
        .selectors {{
            display: flex;
            flex-wrap: wrap;
            gap: 12px 4%;
            margin-bottom: 20px;
        }}
        .selector {{
            width: 48%;
            display: flex;
            flex-direction: column;
            gap: 4px;
        }}
        .selector span {{
            font-size: 12px;
            color: var(--muted-color);
        }}
        .selector select {{
            padding: 6px 8px;
            border: 1px solid var(--border-color);
            border-radius: 4px;
            background: transparent;
            color: var(--text-color);
            font-size: 14px;
        }}
        .chart {{
            overflow-x: auto;
            border: 1px solid var(--border-color);
            border-radius: 8px;
            margin-bottom: 20px;
        }}"#,
            bg = self.theme.background_color,
            text = self.theme.text_color,
            muted = self.theme.muted_text_color,
            border = self.theme.grid_color,
            font = self.theme.font_family,
        )
    }
}

/// A labelled `<select>` that resubmits the form when changed
fn select(name: &str, label: &str, options: &[SelectOption], current: &str) -> String {
    let mut html = format!(
        r#"            <label class="selector">
                <span>{label}</span>
                <select name="{name}" onchange="this.form.submit()">"#,
        label = html_escape(label),
        name = name,
    );

    if options.is_empty() {
        html.push_str("\n                    <option value=\"\" disabled selected>—</option>");
    }
    for option in options {
        let selected = if option.value == current { " selected" } else { "" };
        html.push_str(&format!(
            "\n                    <option value=\"{}\"{}>{}</option>",
            html_escape(&option.value),
            selected,
            html_escape(&option.label)
        ));
    }

    html.push_str("\n                </select>\n            </label>");
    html
}

impl<'a> Renderer<DashboardView<'a>> for DashboardPage {
    type Output = String;

    fn render(&self, view: &DashboardView<'a>) -> Result<String, RenderError> {
        let daily_svg = self.line.render(view.daily)?;
        let summary_svg = self.bar.render(view.summary)?;
        Ok(self.generate_html(view, &daily_svg, &summary_svg))
    }
}

/// HTML-escape a string
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
