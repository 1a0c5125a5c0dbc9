use serde::Serialize;
use tracing::info;

use super::aggregate::aggregate;
use super::directory::{DirectoryBuilder, NameDirectory};
use super::dispatch::{DispatchOutcome, ReportDispatcher};
use super::domain::DirectorReport;
use super::index::CoachingIndex;
use super::records::{coaching_records, worker_records, RawRecord};
use super::source::RecordFetcher;

/// Names the two collections a run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub collection: String,
    pub view: String,
}

impl CollectionRef {
    pub fn new(collection: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            view: view.into(),
        }
    }
}

/// Output of the aggregation stage, before anything is sent.
#[derive(Debug, Clone, Default)]
pub struct ComplianceSnapshot {
    pub names: NameDirectory,
    pub reports: Vec<DirectorReport>,
}

impl ComplianceSnapshot {
    /// Builds the name directory, hierarchy and coaching index from raw
    /// records and aggregates them.
    pub fn from_records(
        workers: &[RawRecord],
        sessions: &[RawRecord],
        excluded_worker: Option<String>,
    ) -> Self {
        let workers = worker_records(workers);
        let names = NameDirectory::from_workers(&workers);
        let directory = DirectoryBuilder::new(excluded_worker).build(&workers);
        let coaching = CoachingIndex::build(&coaching_records(sessions));

        info!(
            workers = workers.len(),
            directory_entries = directory.len(),
            coaching_sessions = coaching.len(),
            "hierarchy reconstructed"
        );

        let reports = aggregate(&directory, &coaching, &names);
        Self { names, reports }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub directors: usize,
    pub delivered: usize,
    pub rejected: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Delivered { .. } => self.delivered += 1,
            DispatchOutcome::Rejected { .. } => self.rejected += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
            DispatchOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// One weekly run: fetch, aggregate, then deliver director by director.
#[derive(Debug, Clone)]
pub struct ComplianceRun {
    fetcher: RecordFetcher,
    workers: CollectionRef,
    coaching: CollectionRef,
    excluded_worker: Option<String>,
}

impl ComplianceRun {
    pub fn new(
        fetcher: RecordFetcher,
        workers: CollectionRef,
        coaching: CollectionRef,
        excluded_worker: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            workers,
            coaching,
            excluded_worker,
        }
    }

    /// Fetches both collections; a failed fetch counts as an empty one.
    pub fn snapshot(&self) -> ComplianceSnapshot {
        let workers = self
            .fetcher
            .fetch(&self.workers.collection, &self.workers.view)
            .unwrap_or_default();
        let sessions = self
            .fetcher
            .fetch(&self.coaching.collection, &self.coaching.view)
            .unwrap_or_default();

        ComplianceSnapshot::from_records(&workers, &sessions, self.excluded_worker.clone())
    }

    pub fn execute(&self, dispatcher: &ReportDispatcher) -> RunSummary {
        let snapshot = self.snapshot();
        deliver(&snapshot, dispatcher)
    }
}

/// Sends every report in order; one director's failure never stops the next.
pub fn deliver(snapshot: &ComplianceSnapshot, dispatcher: &ReportDispatcher) -> RunSummary {
    let mut summary = RunSummary {
        directors: snapshot.reports.len(),
        ..RunSummary::default()
    };

    for report in &snapshot.reports {
        let outcome = dispatcher.dispatch(report, &snapshot.names);
        summary.record(&outcome);
    }

    info!(
        directors = summary.directors,
        delivered = summary.delivered,
        rejected = summary.rejected,
        failed = summary.failed,
        skipped = summary.skipped,
        "compliance run finished"
    );
    summary
}
