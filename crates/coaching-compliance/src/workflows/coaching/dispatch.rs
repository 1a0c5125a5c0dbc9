use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::attachment::{attachment_filename, write_attachment, AttachmentError, CSV_MIME};
use super::directory::NameDirectory;
use super::domain::DirectorReport;
use super::mailer::{
    DeliveryReceipt, EmailAttachment, EmailTransport, MailError, OutgoingEmail, Sender,
};
use super::report::{render_html, render_text, REPORT_SUBJECT};
use super::retry::RetryPolicy;

/// Where director reports are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientRouting {
    /// Each director receives their own report.
    Production,
    /// Every report goes to a single review inbox.
    Development { override_address: String },
}

/// Result of one director's delivery. Never an error: a failed director must
/// not stop the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered {
        recipient: String,
    },
    Rejected {
        recipient: String,
        status_code: u16,
    },
    Failed {
        recipient: String,
        attempts: u32,
        error: String,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub sender: Sender,
    pub routing: RecipientRouting,
    pub csv_path: PathBuf,
    pub report_date: NaiveDate,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct ReportDispatcher {
    transport: Arc<dyn EmailTransport>,
    settings: DispatchSettings,
}

impl ReportDispatcher {
    pub fn new(transport: Arc<dyn EmailTransport>, settings: DispatchSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    fn recipient_for(&self, report: &DirectorReport, names: &NameDirectory) -> Option<String> {
        match &self.settings.routing {
            RecipientRouting::Production => names.email(&report.director_id).map(str::to_string),
            RecipientRouting::Development { override_address } => Some(override_address.clone()),
        }
    }

    /// Writes the CSV, renders the e-mail and sends it with bounded retries.
    pub fn dispatch(&self, report: &DirectorReport, names: &NameDirectory) -> DispatchOutcome {
        let Some(recipient) = self.recipient_for(report, names) else {
            warn!(
                director_id = %report.director_id,
                "no e-mail address on file for director; report not sent"
            );
            return DispatchOutcome::Skipped {
                reason: format!("no e-mail address for director {}", report.director_id),
            };
        };

        let attachment_written = if report.attachment.is_empty() {
            false
        } else {
            match write_attachment(&self.settings.csv_path, &report.attachment) {
                Ok(()) => true,
                Err(err) => {
                    error!(
                        director_id = %report.director_id,
                        error = %err,
                        "could not write attachment"
                    );
                    return DispatchOutcome::Failed {
                        recipient,
                        attempts: 0,
                        error: err.to_string(),
                    };
                }
            }
        };

        let html_body = render_html(report, names);
        let text_body = render_text(report, names);
        let label = format!("send report to {recipient}");

        let send_once = |_attempt: u32| -> Result<DeliveryReceipt, DeliveryError> {
            let email = OutgoingEmail {
                subject: REPORT_SUBJECT.to_string(),
                html_body: html_body.clone(),
                text_body: text_body.clone(),
                from: self.settings.sender.clone(),
                to: recipient.clone(),
                attachment: if attachment_written {
                    Some(self.read_attachment()?)
                } else {
                    None
                },
            };
            Ok(self.transport.send(&email)?)
        };

        let result = self.settings.retry.run(&label, send_once);

        match result {
            Ok(receipt) if receipt.is_success() => {
                info!(director_id = %report.director_id, %recipient, "report e-mail sent");
                DispatchOutcome::Delivered { recipient }
            }
            Ok(receipt) => {
                error!(
                    director_id = %report.director_id,
                    %recipient,
                    status = receipt.status_code,
                    "report e-mail not accepted"
                );
                DispatchOutcome::Rejected {
                    recipient,
                    status_code: receipt.status_code,
                }
            }
            Err(exhausted) => {
                error!(
                    director_id = %report.director_id,
                    %recipient,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "giving up on report e-mail"
                );
                DispatchOutcome::Failed {
                    recipient,
                    attempts: exhausted.attempts,
                    error: exhausted.last_error.to_string(),
                }
            }
        }
    }

    fn read_attachment(&self) -> Result<EmailAttachment, AttachmentError> {
        let bytes = std::fs::read(&self.settings.csv_path)?;
        let base = self
            .settings
            .csv_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("coaching_report.csv");
        Ok(EmailAttachment {
            filename: attachment_filename(base, self.settings.report_date),
            content_type: CSV_MIME.to_string(),
            bytes,
        })
    }
}
