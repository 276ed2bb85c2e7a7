//! Batch file input and output.

use std::path::Path;

use accessgate_core::{InboundRequest, MultiDecision, Summary};
use accessgate_telemetry::AUDIT_TARGET;
use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Read and parse the request batch.
pub(crate) async fn read_requests(path: &Path) -> Result<Vec<InboundRequest>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read input {}", path.display()))?;
    parse_requests(&raw).with_context(|| format!("invalid request batch in {}", path.display()))
}

fn parse_requests(raw: &str) -> Result<Vec<InboundRequest>> {
    Ok(serde_json::from_str(raw)?)
}

/// Totals across every request in the batch.
pub(crate) fn batch_summary(decisions: &[MultiDecision]) -> Summary {
    decisions.iter().fold(Summary::default(), |mut acc, d| {
        acc.absorb(&d.summary);
        acc
    })
}

pub(crate) fn log_summary(decisions: &[MultiDecision]) {
    let totals = batch_summary(decisions);
    info!(
        target: AUDIT_TARGET,
        requests = decisions.len(),
        total = totals.total,
        approved = totals.approved,
        denied = totals.denied,
        requires_approval = totals.requires_approval,
        clarification_needed = totals.clarification_needed,
        "batch complete"
    );
}

/// Write decisions as pretty JSON to `output`, or stdout when absent.
pub(crate) async fn write_decisions(decisions: &[MultiDecision], output: Option<&Path>) -> Result<()> {
    let mut json = serde_json::to_string_pretty(decisions).context("failed to encode decisions")?;
    json.push('\n');

    match output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(json.as_bytes()).await?;
            stdout.flush().await?;
        },
    }
    Ok(())
}
