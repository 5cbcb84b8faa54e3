// Command handlers for workspace lifecycle operations

use std::sync::Arc;

use anyhow::{Context, Result};
use gs_messages::{msg, MESSAGES};
use gs_orchestrator::report::failures;
use gs_orchestrator::{
    ArchiveReport, CreateReport, DeleteReport, StepOutcome, UnarchiveReport,
    WorkspaceOrchestrator,
};
use gs_platform::discord::DiscordClient;
use gs_platform::PlatformClient;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Args, Command};
use crate::config::Config;

/// Main command dispatcher
pub async fn execute_command(args: Args) -> Result<()> {
    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!(msg!(MESSAGES.error_config, error = e)))?;
    debug!(?config, "Loaded configuration");

    let client = DiscordClient::connect(config.discord())
        .await
        .context("Failed to connect to Discord")?;
    info!(platform = client.name(), service_id = %client.service_id(), "Connected");

    let settings = config.orchestrator_settings(args.concurrency.map(usize::from));
    let orchestrator = WorkspaceOrchestrator::new(Arc::new(client), settings);

    let output = run(&orchestrator, &args.command, args.json).await?;
    println!("{output}");
    Ok(())
}

/// Run one workflow and render its outcome for the terminal.
pub async fn run(orchestrator: &WorkspaceOrchestrator, command: &Command, json: bool) -> Result<String> {
    let name = command.display_name();

    match command {
        Command::Create { .. } => {
            info!("{}", msg!(MESSAGES.create_in_progress, name = &name));
            let report = orchestrator.create_workspace(&name).await?;
            render(json, &report, render_create)
        }
        Command::Archive { .. } => {
            info!("{}", msg!(MESSAGES.archive_in_progress, name = &name));
            let report = orchestrator.archive_workspace(&name).await?;
            render(json, &report, render_archive)
        }
        Command::Unarchive { .. } => {
            info!("{}", msg!(MESSAGES.unarchive_in_progress, name = &name));
            let report = orchestrator.unarchive_workspace(&name).await?;
            render(json, &report, render_unarchive)
        }
        Command::Delete { .. } => {
            info!("{}", msg!(MESSAGES.delete_in_progress, name = &name));
            let report = orchestrator.delete_workspace(&name).await?;
            render(json, &report, render_delete)
        }
    }
}

fn render<R: serde::Serialize>(json: bool, report: &R, text: fn(&R) -> String) -> Result<String> {
    if json {
        let value: Value = serde_json::to_value(report).context("Failed to encode report")?;
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(text(report))
    }
}

fn render_create(report: &CreateReport) -> String {
    let mut out = msg!(
        MESSAGES.create_success,
        name = &report.info.display_name,
        group_id = report.group_id
    );
    if report.failed > 0 {
        out.push('\n');
        out.push_str(&msg!(
            MESSAGES.create_partial,
            failed = report.failed,
            total = report.steps.len()
        ));
    }
    append_failures(out, &report.steps)
}

fn render_archive(report: &ArchiveReport) -> String {
    let out = msg!(
        MESSAGES.archive_success,
        name = &report.info.display_name,
        moved = report.moved,
        voice_deleted = report.voice_deleted
    );
    append_failures(out, &report.steps)
}

fn render_unarchive(report: &UnarchiveReport) -> String {
    let out = msg!(
        MESSAGES.unarchive_success,
        name = &report.info.display_name,
        moved = report.moved,
        group_id = report.group_id
    );
    append_failures(out, &report.steps)
}

fn render_delete(report: &DeleteReport) -> String {
    let out = msg!(
        MESSAGES.delete_success,
        name = &report.info.display_name,
        text_deleted = report.text_deleted,
        voice_deleted = report.voice_deleted
    );
    append_failures(out, &report.steps)
}

fn append_failures(mut out: String, steps: &[StepOutcome]) -> String {
    let failed: Vec<&StepOutcome> = failures(steps).collect();
    if failed.is_empty() {
        return out;
    }

    out.push('\n');
    out.push_str(&msg!(MESSAGES.step_failed_header, count = failed.len()));
    for step in failed {
        out.push('\n');
        out.push_str(&msg!(
            MESSAGES.step_failed,
            action = format!("{:?}", step.action),
            target = &step.target,
            error = step.error.as_deref().unwrap_or_default()
        ));
    }
    out
}
