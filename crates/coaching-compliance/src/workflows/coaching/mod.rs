mod aggregate;
pub mod attachment;
pub mod directory;
pub mod dispatch;
pub mod domain;
mod index;
pub mod mailer;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod retry;
pub mod source;
pub mod throttle;

pub use aggregate::aggregate;
pub use directory::{DirectoryBuilder, NameDirectory, NameLookup};
pub use dispatch::{DispatchOutcome, DispatchSettings, RecipientRouting, ReportDispatcher};
pub use domain::{
    AttachmentRow, CoachingPair, ComplianceStatus, DirectorReport, DirectoryEntry,
    ManagerSummary, WorkerId,
};
pub use index::CoachingIndex;
pub use mailer::{EmailTransport, SmtpMailer};
pub use pipeline::{CollectionRef, ComplianceRun, ComplianceSnapshot, RunSummary};
pub use records::RawRecord;
pub use report::{DirectorReportView, ManagerSummaryView};
pub use retry::RetryPolicy;
pub use source::{AirtableClient, RecordFetcher, RecordPage, RecordSource};
pub use throttle::RateGate;
