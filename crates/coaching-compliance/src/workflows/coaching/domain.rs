use serde::{Deserialize, Serialize};
use std::fmt;

/// Record identifier issued by the data source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One row of the employee -> manager -> director relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DirectoryEntry {
    pub employee_id: WorkerId,
    pub manager_id: WorkerId,
    pub director_id: WorkerId,
}

/// A logged coaching session reduced to its two participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CoachingPair {
    pub coach_id: Option<WorkerId>,
    pub trainee_id: Option<WorkerId>,
}

/// Compliance band derived from a manager's coaching percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Complete,
    Pending,
    FollowUpRequired,
}

impl ComplianceStatus {
    pub const FOLLOW_UP_THRESHOLD: f64 = 85.0;

    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Complete
        } else if percentage < Self::FOLLOW_UP_THRESHOLD {
            Self::FollowUpRequired
        } else {
            Self::Pending
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Complete => "✅",
            Self::Pending => "⚠️",
            Self::FollowUpRequired => "❌",
        }
    }

    pub fn notes(self, uncoached: usize) -> String {
        match self {
            Self::Complete => "Complete".to_string(),
            Self::Pending => format!("{uncoached} Pending"),
            Self::FollowUpRequired => "Follow-up required".to_string(),
        }
    }
}

/// Per-manager compliance figures for one director.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerSummary {
    pub manager_id: WorkerId,
    pub num_of_employees: usize,
    pub coaching_logs: usize,
    pub compliance_percentage: f64,
    pub notes: String,
    pub status: ComplianceStatus,
}

impl ManagerSummary {
    pub fn new(manager_id: WorkerId, num_of_employees: usize, coaching_logs: usize) -> Self {
        let compliance_percentage = compliance_percentage(coaching_logs, num_of_employees);
        let status = ComplianceStatus::from_percentage(compliance_percentage);
        let notes = status.notes(num_of_employees.saturating_sub(coaching_logs));

        Self {
            manager_id,
            num_of_employees,
            coaching_logs,
            compliance_percentage,
            notes,
            status,
        }
    }

    pub fn status_icon(&self) -> &'static str {
        self.status.icon()
    }
}

pub fn compliance_percentage(coached: usize, employees: usize) -> f64 {
    if employees == 0 {
        return 0.0;
    }
    (coached as f64 / employees as f64) * 100.0
}

/// Flat attachment line: one per employee under a reported manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRow {
    #[serde(rename = "Manager")]
    pub manager: String,
    #[serde(rename = "Employee")]
    pub employee: String,
    #[serde(rename = "Coached")]
    pub coached: String,
}

impl AttachmentRow {
    pub fn new(manager: impl Into<String>, employee: impl Into<String>, coached: bool) -> Self {
        Self {
            manager: manager.into(),
            employee: employee.into(),
            coached: if coached { "Yes" } else { "No" }.to_string(),
        }
    }
}

/// Everything one director receives in a single run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorReport {
    pub director_id: WorkerId,
    pub managers: Vec<ManagerSummary>,
    pub attachment: Vec<AttachmentRow>,
}
