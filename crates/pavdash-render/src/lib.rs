//! # pavdash-render
//!
//! Rendering backends for the pavdash chart tables.
//!
//! This crate provides:
//! - SVG line chart of daily production ([`LineChartRenderer`])
//! - SVG grouped bar chart of realized vs planned totals ([`BarChartRenderer`])
//! - Standalone HTML dashboard with selectors and both charts ([`DashboardPage`])
//!
//! Every renderer accepts empty tables and draws a "Sem dados" placeholder.
//!
//! ## Example
//!
//! ```rust
//! use pavdash_core::reshape::DailySeriesTable;
//! use pavdash_core::Renderer;
//! use pavdash_render::LineChartRenderer;
//!
//! let svg = LineChartRenderer::new().render(&DailySeriesTable::default()).unwrap();
//! assert!(svg.contains("Sem dados"));
//! ```

mod chart;
pub mod bar;
pub mod line;
pub mod page;

pub use bar::{BarChartRenderer, SUMMARY_CHART_TITLE};
pub use chart::ChartTheme;
pub use line::{LineChartRenderer, DAILY_CHART_TITLE};
pub use page::{DashboardPage, DashboardView, DASHBOARD_TITLE};
