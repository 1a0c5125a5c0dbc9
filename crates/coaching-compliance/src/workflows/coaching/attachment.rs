use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use super::domain::AttachmentRow;

pub const CSV_MIME: mime::Mime = mime::TEXT_CSV;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("failed to write attachment: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode attachment: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the rows to `path` with a `Manager,Employee,Coached` header.
///
/// The file is flushed and closed before this returns.
pub fn write_attachment(path: &Path, rows: &[AttachmentRow]) -> Result<(), AttachmentError> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    let mut file = writer
        .into_inner()
        .map_err(|err| AttachmentError::Io(err.into_error()))?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

/// `coaching_report.csv` -> `coaching_report_week42.csv` for the ISO week of `date`.
pub fn attachment_filename(base: &str, date: NaiveDate) -> String {
    let week = date.iso_week().week();
    match base.strip_suffix(".csv") {
        Some(stem) => format!("{stem}_week{week}.csv"),
        None => format!("{base}_week{week}.csv"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_embeds_iso_week() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        assert_eq!(
            attachment_filename("coaching_report.csv", date),
            "coaching_report_week42.csv"
        );

        let new_year = NaiveDate::from_ymd_opt(2027, 1, 1).expect("valid date");
        assert_eq!(attachment_filename("report", new_year), "report_week53.csv");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("coaching_report.csv");
        let rows = vec![
            AttachmentRow::new("Alice", "Bob", true),
            AttachmentRow::new("Alice", "Cara, Jr.", false),
        ];

        write_attachment(&path, &rows).expect("attachment written");

        let contents = std::fs::read_to_string(&path).expect("attachment readable");
        assert_eq!(
            contents,
            "Manager,Employee,Coached\nAlice,Bob,Yes\nAlice,\"Cara, Jr.\",No\n"
        );
    }
}
