//! CLI entry point for batch synchronization.
//!
//! # Responsibility
//! - Drive `batchsync_core` operations against SQLite files from a shell.
//! - Print deterministic JSON so runs can be diffed and scripted.
//!
//! # Invariants
//! - Configuration comes from `BATCHSYNC_*` environment variables only.
//! - Exit code is non-zero for every failed command.

use batchsync_core::db::open_db;
use batchsync_core::{
    ActivityBatchService, AttachCertificateRequest, BatchCommand, BatchError,
    RemoveCertificateRequest, SqliteBatchIndex, SqliteBatchStore, SyncConfig,
};
use log::info;
use std::process::ExitCode;

const USAGE: &str = "usage:
  batchsync ping
  batchsync attach <column-db> <index-db> <request.json>
  batchsync detach <column-db> <index-db> <activity-id> <batch-id> <template-id>
  batchsync run <column-db> <index-db> <command.json>
  batchsync validate <index-db> <batch-id> [activity-id]";

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
    if let ["ping"] = args.as_slice() {
        return Ok(format!(
            "batchsync_core ping={} version={}",
            batchsync_core::ping(),
            batchsync_core::core_version()
        ));
    }

    let config = SyncConfig::from_env().map_err(|err| format!("config error: {err}"))?;
    batchsync_core::init_logging_from_config(&config)
        .map_err(|err| format!("logging error: {err}"))?;
    let normalizer = config
        .normalizer()
        .map_err(|err| format!("config error: {err}"))?;

    let command = match args.as_slice() {
        ["attach", _, _, request_path] => {
            let request: AttachCertificateRequest = read_json(request_path)?;
            BatchCommand::AddCertificate(request)
        }
        ["detach", _, _, activity_id, batch_id, template_id] => {
            BatchCommand::RemoveCertificate(RemoveCertificateRequest {
                activity_id: activity_id.to_string(),
                batch_id: batch_id.to_string(),
                template_id: template_id.to_string(),
                requested_by: None,
            })
        }
        ["run", _, _, command_path] => read_json(command_path)?,
        ["validate", index_db, batch_id, rest @ ..] if rest.len() <= 1 => {
            let conn = open_db(index_db).map_err(|err| format!("db error: {err}"))?;
            let index = SqliteBatchIndex::new(&conn);
            let document = batchsync_core::service::validator::validate_activity_batch(
                &index,
                batch_id,
                rest.first().copied(),
            )
            .map_err(render_error)?;
            return to_json(&document);
        }
        _ => return Err(USAGE.to_string()),
    };

    let (column_db, index_db) = (args[1], args[2]);
    let column_conn = open_db(column_db).map_err(|err| format!("db error: {err}"))?;
    let index_conn = open_db(index_db).map_err(|err| format!("db error: {err}"))?;
    let service = ActivityBatchService::new(
        SqliteBatchStore::new(&column_conn),
        SqliteBatchIndex::new(&index_conn),
        normalizer,
    );

    info!(
        "event=cli_command module=cli status=start operation={}",
        command.operation()
    );
    let response = service.handle(command).map_err(render_error)?;
    to_json(&response)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    serde_json::from_str(&text).map_err(|err| format!("invalid JSON in `{path}`: {err}"))
}

fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("cannot render output: {err}"))
}

fn render_error(err: BatchError) -> String {
    format!("{}: {err}", err.kind().as_str())
}

#[cfg(test)]
mod tests {
    use super::{run, USAGE};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn ping_reports_core_version() {
        let output = run(&args(&["ping"])).unwrap();
        assert!(output.starts_with("batchsync_core ping=pong"));
    }

    #[test]
    fn unknown_command_prints_usage() {
        assert_eq!(run(&args(&["frobnicate"])).unwrap_err(), USAGE);
    }

    #[test]
    fn validate_missing_batch_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let index_db = dir.path().join("index.db");
        let err = run(&args(&["validate", index_db.to_str().unwrap(), "B404"])).unwrap_err();
        assert!(err.starts_with("not_found:"));
    }
}
