use chrono::Local;
use clap::Args;
use coaching_compliance::config::{AppConfig, AppEnvironment};
use coaching_compliance::error::AppError;
use coaching_compliance::telemetry;
use coaching_compliance::workflows::coaching::mailer::Sender;
use coaching_compliance::workflows::coaching::pipeline::deliver;
use coaching_compliance::workflows::coaching::records::read_export;
use coaching_compliance::workflows::coaching::{
    AirtableClient, CollectionRef, ComplianceRun, ComplianceSnapshot, DirectorReportView,
    DispatchSettings, RateGate, RecipientRouting, RecordFetcher, ReportDispatcher, RetryPolicy,
    RunSummary, SmtpMailer,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

const START_BANNER: &str = " --------------- Starting execution";
const END_BANNER: &str = " --------------- Finished execution";

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Send every report to TEST_EMAIL regardless of DEV_MODE
    #[arg(long)]
    pub(crate) dev: bool,
    /// Fetch and aggregate, print the reports, but send nothing
    #[arg(long)]
    pub(crate) dry_run: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// Worker directory export (JSON page or array of records)
    #[arg(long)]
    pub(crate) workers: PathBuf,
    /// Coaching session export (JSON page or array of records)
    #[arg(long)]
    pub(crate) coaching: PathBuf,
    /// Display name to leave out of the hierarchy
    #[arg(long)]
    pub(crate) excluded_worker: Option<String>,
    /// Print the reports as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

/// Runs the weekly report. Failures after start-up are logged, never returned,
/// so the process always finishes with both banners.
pub(crate) fn run_report(args: RunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let environment = if args.dev {
        AppEnvironment::Development
    } else {
        config.environment
    };

    println!("{START_BANNER}");
    println!("Running in {} mode", environment.label());

    match execute(&config, environment, args.dry_run) {
        Ok(summary) => println!(
            "Reports: {} director(s), {} delivered, {} rejected, {} failed, {} skipped",
            summary.directors, summary.delivered, summary.rejected, summary.failed, summary.skipped
        ),
        Err(err) => {
            error!(error = %err, "compliance run aborted");
            eprintln!("compliance run aborted: {err}");
        }
    }

    println!("{END_BANNER}");
    Ok(())
}

fn execute(
    config: &AppConfig,
    environment: AppEnvironment,
    dry_run: bool,
) -> Result<RunSummary, AppError> {
    let dispatcher = if dry_run {
        None
    } else {
        Some(build_dispatcher(config, environment)?)
    };

    let client = AirtableClient::new(config.airtable.require_api_key()?, &config.airtable.base_id)?;
    let fetcher = RecordFetcher::new(
        Arc::new(client),
        Arc::new(RateGate::default()),
        RetryPolicy::record_fetch(),
    );
    let run = ComplianceRun::new(
        fetcher,
        CollectionRef::new(&config.airtable.workers_table, &config.airtable.workers_view),
        CollectionRef::new(&config.airtable.coaching_table, &config.airtable.coaching_view),
        config.report.excluded_worker.clone(),
    );

    let snapshot = run.snapshot();
    match dispatcher {
        Some(dispatcher) => Ok(deliver(&snapshot, &dispatcher)),
        None => {
            print_snapshot(&snapshot);
            Ok(RunSummary {
                directors: snapshot.reports.len(),
                skipped: snapshot.reports.len(),
                ..RunSummary::default()
            })
        }
    }
}

fn build_dispatcher(
    config: &AppConfig,
    environment: AppEnvironment,
) -> Result<ReportDispatcher, AppError> {
    let (name, address) = config.email.require_sender()?;
    let (username, password) = config.email.require_credentials()?;
    let routing = match environment {
        AppEnvironment::Production => RecipientRouting::Production,
        AppEnvironment::Development => RecipientRouting::Development {
            override_address: config.email.require_test_recipient()?,
        },
    };

    let mailer = SmtpMailer::new(
        &config.email.smtp_host,
        config.email.smtp_port,
        username,
        password,
    )?;

    Ok(ReportDispatcher::new(
        Arc::new(mailer),
        DispatchSettings {
            sender: Sender { name, address },
            routing,
            csv_path: config.report.csv_path.clone(),
            report_date: Local::now().date_naive(),
            retry: RetryPolicy::email_delivery(),
        },
    ))
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let PreviewArgs {
        workers,
        coaching,
        excluded_worker,
        json,
    } = args;

    let workers = read_export(BufReader::new(File::open(workers)?))?;
    let sessions = read_export(BufReader::new(File::open(coaching)?))?;
    let snapshot = ComplianceSnapshot::from_records(&workers, &sessions, excluded_worker);

    if json {
        let views = report_views(&snapshot);
        match serde_json::to_string_pretty(&views) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Report payload unavailable: {err}"),
        }
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

pub(crate) fn report_views(snapshot: &ComplianceSnapshot) -> Vec<DirectorReportView> {
    snapshot
        .reports
        .iter()
        .map(|report| DirectorReportView::from_report(report, &snapshot.names))
        .collect()
}

fn print_snapshot(snapshot: &ComplianceSnapshot) {
    if snapshot.reports.is_empty() {
        println!("No director reports: no manager with direct reports was found.");
        return;
    }

    for view in report_views(snapshot) {
        println!(
            "\nDirector {} <{}>",
            view.director_name,
            view.director_email.as_deref().unwrap_or("no e-mail on file")
        );
        for manager in &view.managers {
            println!(
                "- {}: {}/{} coached ({:.0}%) | {} {}",
                manager.manager_name,
                manager.coaching_logs,
                manager.num_of_employees,
                manager.compliance_percentage,
                manager.notes,
                manager.status_icon
            );
        }
        println!("  Attachment rows: {}", view.attachment.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).expect("create export");
        file.write_all(body.as_bytes()).expect("write export");
        path
    }

    #[test]
    fn preview_reads_exports_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workers = write_json(
            &dir,
            "workers.json",
            r#"{"records":[
                {"id":"M1","fields":{"Worker":"Alice"}},
                {"id":"D1","fields":{"Worker":"Dana"}},
                {"id":"E1","fields":{"Worker":"Bob","Manager":["M1"],"Brand Director":["D1"]}}
            ]}"#,
        );
        let coaching = write_json(
            &dir,
            "coaching.json",
            r#"[{"id":"S1","fields":{"Coach":["M1"],"Trainee":["E1"]}}]"#,
        );

        let args = PreviewArgs {
            workers,
            coaching,
            excluded_worker: None,
            json: true,
        };
        run_preview(args).expect("preview runs");
    }

    #[test]
    fn preview_surfaces_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = PreviewArgs {
            workers: dir.path().join("missing.json"),
            coaching: dir.path().join("missing.json"),
            excluded_worker: None,
            json: false,
        };
        let err = run_preview(args).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
