mod render;
pub mod views;

pub use render::{render_html, render_text, REPORT_SUBJECT};
pub use views::{DirectorReportView, ManagerSummaryView};
