use std::fmt::Write as _;

use super::super::directory::{NameDirectory, NOT_FOUND_LABEL};
use super::super::domain::DirectorReport;

pub const REPORT_SUBJECT: &str = "Weekly Coaching Compliance Report";

const CELL: &str = "border: 1px solid #ddd; padding: 8px;";
const CENTERED_CELL: &str = "border: 1px solid #ddd; padding: 8px; text-align: center;";
const NAME_CELL: &str = "width:auto; white-space:nowrap; border:1px solid #ddd; padding:8px;";
const COLUMNS: [&str; 6] = [
    "Manager",
    "Direct Reports",
    "Coaching Logs",
    "Compliance %",
    "Notes",
    "Status",
];

pub fn render_html(report: &DirectorReport, names: &NameDirectory) -> String {
    let mut html = String::new();
    let greeting = escape_html(names.name_or(&report.director_id, NOT_FOUND_LABEL));

    html.push_str("<html>\n<body>\n");
    let _ = writeln!(html, "<p>Hello {greeting}!</p>");
    html.push_str(
        "<p>Please see below the Weekly Coaching Compliance Report for your Husk.</p>\n",
    );
    html.push_str("<h2>Coaching Compliance Report</h2>\n");
    html.push_str("<table style=\"border-collapse: collapse; width: 100%;\">\n");
    html.push_str("<tr style=\"background-color: #4CAF50; color: white;\">\n");
    for column in COLUMNS {
        let _ = writeln!(html, "<th style=\"{CELL}\">{column}</th>");
    }
    html.push_str("</tr>\n");

    for summary in &report.managers {
        html.push_str("<tr>\n");
        let _ = writeln!(
            html,
            "<td style=\"{NAME_CELL}\">{}</td>",
            escape_html(names.name_or(&summary.manager_id, NOT_FOUND_LABEL))
        );
        let _ = writeln!(
            html,
            "<td style=\"{CENTERED_CELL}\">{}</td>",
            summary.num_of_employees
        );
        let _ = writeln!(
            html,
            "<td style=\"{CENTERED_CELL}\">{}</td>",
            summary.coaching_logs
        );
        let _ = writeln!(
            html,
            "<td style=\"{CENTERED_CELL}\">{:.0}%</td>",
            summary.compliance_percentage
        );
        let _ = writeln!(html, "<td style=\"{CELL}\">{}</td>", escape_html(&summary.notes));
        let _ = writeln!(
            html,
            "<td style=\"{CENTERED_CELL}\">{}</td>",
            summary.status_icon()
        );
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
    html.push_str(
        "<p>This automated report is sent every Friday EOD to help you track coaching activity and ensure all managers remain compliant.</p>\n",
    );
    html.push_str(
        "<p>If you have any questions or need adjustments to the report, please let us know.</p>\n",
    );
    html.push_str("<p>Thank you!</p>\n</body>\n</html>\n");
    html
}

/// Plain-text alternative for clients that do not render HTML.
pub fn render_text(report: &DirectorReport, names: &NameDirectory) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "Hello {}!",
        names.name_or(&report.director_id, NOT_FOUND_LABEL)
    );
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "Please see below the Weekly Coaching Compliance Report for your Husk."
    );
    let _ = writeln!(text);

    for summary in &report.managers {
        let _ = writeln!(
            text,
            "- {}: {} direct report(s), {} coaching log(s), {:.0}% compliant, {} {}",
            names.name_or(&summary.manager_id, NOT_FOUND_LABEL),
            summary.num_of_employees,
            summary.coaching_logs,
            summary.compliance_percentage,
            summary.notes,
            summary.status_icon()
        );
    }

    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "This automated report is sent every Friday EOD to help you track coaching activity."
    );
    text
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::coaching::domain::{ManagerSummary, WorkerId};
    use crate::workflows::coaching::records::WorkerRecord;

    fn names() -> NameDirectory {
        let worker = |id: &str, name: &str| WorkerRecord {
            id: WorkerId::from(id),
            name: Some(name.to_string()),
            email: None,
            manager_id: None,
            director_id: None,
        };
        NameDirectory::from_workers(&[worker("D1", "Dana"), worker("M1", "Alice & Co")])
    }

    fn report() -> DirectorReport {
        DirectorReport {
            director_id: WorkerId::from("D1"),
            managers: vec![
                ManagerSummary::new(WorkerId::from("M1"), 3, 2),
                ManagerSummary::new(WorkerId::from("M404"), 1, 1),
            ],
            attachment: Vec::new(),
        }
    }

    #[test]
    fn html_contains_greeting_rows_and_escaped_names() {
        let html = render_html(&report(), &names());
        assert!(html.contains("<p>Hello Dana!</p>"));
        assert!(html.contains("Alice &amp; Co"));
        assert!(html.contains(">67%</td>"));
        assert!(html.contains(">100%</td>"));
        assert!(html.contains(NOT_FOUND_LABEL));
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("Direct Reports"));
    }

    #[test]
    fn unknown_director_greeting_uses_placeholder() {
        let mut report = report();
        report.director_id = WorkerId::from("D404");
        let text = render_text(&report, &names());
        assert!(text.starts_with(&format!("Hello {NOT_FOUND_LABEL}!")));
        assert!(text.contains("Follow-up required ❌"));
        assert!(text.contains("Complete ✅"));
    }
}
