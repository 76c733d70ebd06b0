//! Report renderers.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use rdbox_app::{Outcome, RunReport};

use crate::cli::OutputFormat;

pub(crate) fn render_report(report: &RunReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to format report as JSON")
        }
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &RunReport) -> String {
    let headline = match report.outcome {
        Outcome::FullyMatched => "all available dropboxes are running",
        Outcome::Confirmed => "supervisor restarted; it came back on its own",
        Outcome::Relaunched => "supervisor restarted",
        Outcome::RelaunchFailed => "supervisor could not be relaunched",
    };
    let mut line = format!(
        "{}: {headline} (matched {}, unmatched {}, dropped {}, errors {})",
        report.station,
        report.matched_pids.len(),
        report.unmatched.len(),
        report.dropped.len(),
        report.error_count
    );
    for dropped in &report.dropped {
        let _ = write!(
            line,
            "\n  dropped dropbox {} ({}): {}",
            dropped.id,
            if dropped.path.is_empty() {
                "<empty path>"
            } else {
                dropped.path.as_str()
            },
            dropped.reason.as_str()
        );
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::Utc;
    use rdbox_app::{DropReason, DroppedDropbox, Phase};
    use std::collections::BTreeSet;

    fn report(outcome: Outcome) -> RunReport {
        RunReport {
            station: "onair-1".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            phases: vec![Phase::Load, Phase::Done],
            dropped: Vec::new(),
            warnings: Vec::new(),
            repairs: Vec::new(),
            matched_pids: BTreeSet::from([10, 11]),
            unmatched: Vec::new(),
            terminated: Vec::new(),
            error_count: 0,
            outcome,
        }
    }

    #[test]
    fn text_summary_names_counts_and_dropped_dropboxes() {
        let mut report = report(Outcome::Relaunched);
        report.unmatched = vec![3];
        report.error_count = 1;
        report.dropped.push(DroppedDropbox {
            id: 4,
            path: String::new(),
            reason: DropReason::PathSyntax,
        });
        let text = render_text(&report);
        assert!(text.starts_with("onair-1: supervisor restarted (matched 2, unmatched 1, dropped 1, errors 1)"));
        assert!(text.contains("dropped dropbox 4 (<empty path>): path_syntax"));
    }

    #[test]
    fn json_output_is_the_full_report() -> Result<()> {
        let rendered = render_report(&report(Outcome::FullyMatched), OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&rendered)?;
        assert_eq!(value["outcome"], "fully_matched");
        assert_eq!(value["matched_pids"], serde_json::json!([10, 11]));
        Ok(())
    }
}
