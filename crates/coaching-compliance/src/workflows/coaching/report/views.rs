use serde::Serialize;

use super::super::directory::{NameDirectory, NOT_FOUND_LABEL};
use super::super::domain::{
    AttachmentRow, ComplianceStatus, DirectorReport, ManagerSummary, WorkerId,
};

#[derive(Debug, Clone, Serialize)]
pub struct ManagerSummaryView {
    pub manager_id: WorkerId,
    pub manager_name: String,
    pub num_of_employees: usize,
    pub coaching_logs: usize,
    pub compliance_percentage: f64,
    pub notes: String,
    pub status: ComplianceStatus,
    pub status_icon: &'static str,
}

impl ManagerSummaryView {
    pub fn from_summary(summary: &ManagerSummary, names: &NameDirectory) -> Self {
        Self {
            manager_id: summary.manager_id.clone(),
            manager_name: names
                .name_or(&summary.manager_id, NOT_FOUND_LABEL)
                .to_string(),
            num_of_employees: summary.num_of_employees,
            coaching_logs: summary.coaching_logs,
            compliance_percentage: summary.compliance_percentage,
            notes: summary.notes.clone(),
            status: summary.status,
            status_icon: summary.status_icon(),
        }
    }
}

/// Director report with every identifier resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct DirectorReportView {
    pub director_id: WorkerId,
    pub director_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director_email: Option<String>,
    pub managers: Vec<ManagerSummaryView>,
    pub attachment: Vec<AttachmentRow>,
}

impl DirectorReportView {
    pub fn from_report(report: &DirectorReport, names: &NameDirectory) -> Self {
        Self {
            director_id: report.director_id.clone(),
            director_name: names
                .name_or(&report.director_id, NOT_FOUND_LABEL)
                .to_string(),
            director_email: names.email(&report.director_id).map(str::to_string),
            managers: report
                .managers
                .iter()
                .map(|summary| ManagerSummaryView::from_summary(summary, names))
                .collect(),
            attachment: report.attachment.clone(),
        }
    }
}
