//! Output formatters for commit test results
//!
//! Provides the live status table and the end-of-run report formats.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::executor::StatusRegistry;
use crate::models::{Commit, RunReport};

/// Report format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Status table only
    #[default]
    Table,
    /// Compact JSON report
    Json,
    /// Indented JSON report
    JsonPretty,
    /// Status table followed by a one-line summary
    Summary,
}

impl OutputFormat {
    /// Whether the status table is drawn on stdout
    pub fn shows_table(&self) -> bool {
        matches!(self, OutputFormat::Table | OutputFormat::Summary)
    }
}

/// How the status table is drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Live redraw when stdout is a terminal, plain otherwise
    #[default]
    Auto,
    /// Redraw the table in place after every status change
    Live,
    /// Print the final table once
    Plain,
}

impl DisplayMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(DisplayMode::Auto),
            "live" => Some(DisplayMode::Live),
            "plain" | "final" => Some(DisplayMode::Plain),
            _ => None,
        }
    }

    /// Collapse `Auto` using whether the output stream is a terminal
    pub fn resolve(self, is_terminal: bool) -> Self {
        match self {
            DisplayMode::Auto if is_terminal => DisplayMode::Live,
            DisplayMode::Auto => DisplayMode::Plain,
            other => other,
        }
    }
}

/// One table row: `<short_id> [<STATUS>] <subject>`
pub fn format_row(commit: &Commit, status: impl std::fmt::Display) -> String {
    format!("{} [{}] {}", commit.short_id, status, commit.subject)
}

/// The whole status table in resolved commit order
pub fn render_table(commits: &[Commit], registry: &StatusRegistry) -> String {
    let mut output = String::new();
    for commit in commits {
        output.push_str(&format_row(commit, registry.get(&commit.full_id)));
        output.push('\n');
    }
    output
}

/// End-of-run report formatter
pub struct ResultFormatter {
    format: OutputFormat,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Text printed after the table, if any
    pub fn format_report(&self, report: &RunReport) -> serde_json::Result<Option<String>> {
        let text = match self.format {
            OutputFormat::Table => None,
            OutputFormat::Json => Some(serde_json::to_string(report)?),
            OutputFormat::JsonPretty => Some(serde_json::to_string_pretty(report)?),
            OutputFormat::Summary => Some(format!(
                "{} ({:.1}% passed)",
                report.summary,
                report.summary.pass_rate()
            )),
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitResult, RunSummary, Status};
    use chrono::Utc;

    fn commits() -> Vec<Commit> {
        vec![
            Commit::new("c1full", "c1", "Add feature"),
            Commit::new("c2full", "c2", "Fix bug"),
            Commit::new("c3full", "c3", "Refactor"),
        ]
    }

    #[test]
    fn test_render_table_defaults_to_waiting() {
        let registry = StatusRegistry::new();
        let table = render_table(&commits(), &registry);
        assert_eq!(
            table,
            "c1 [WAITING] Add feature\nc2 [WAITING] Fix bug\nc3 [WAITING] Refactor\n"
        );
    }

    #[test]
    fn test_render_table_ignores_update_order() {
        let commits = commits();

        let forward = StatusRegistry::new();
        forward.set("c1full", Status::Pass);
        forward.set("c2full", Status::Fail);
        forward.set("c3full", Status::Running);

        let backward = StatusRegistry::new();
        backward.set("c3full", Status::Running);
        backward.set("c2full", Status::Fail);
        backward.set("c1full", Status::Pass);

        let table = render_table(&commits, &forward);
        assert_eq!(table, render_table(&commits, &backward));
        assert_eq!(
            table,
            "c1 [PASS] Add feature\nc2 [FAIL] Fix bug\nc3 [RUNNING] Refactor\n"
        );
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_table(&[], &StatusRegistry::new()), "");
    }

    #[test]
    fn test_format_row() {
        let commit = Commit::new("c1full", "c1", "Add feature");
        assert_eq!(format_row(&commit, Status::Running), "c1 [RUNNING] Add feature");
    }

    #[test]
    fn test_display_mode_resolution() {
        assert_eq!(DisplayMode::Auto.resolve(true), DisplayMode::Live);
        assert_eq!(DisplayMode::Auto.resolve(false), DisplayMode::Plain);
        assert_eq!(DisplayMode::Live.resolve(false), DisplayMode::Live);
        assert_eq!(DisplayMode::from_str("FINAL"), Some(DisplayMode::Plain));
        assert_eq!(DisplayMode::from_str("fancy"), None);
    }

    #[test]
    fn test_format_report() {
        let results = [Status::Pass, Status::Fail]
            .into_iter()
            .zip(commits())
            .map(|(status, commit)| CommitResult {
                commit,
                status,
                duration_ms: 10,
                previous: None,
            })
            .collect();
        let summary = RunSummary::new(results, 20);
        let report = RunReport::new("main..@", "exit 0", Utc::now(), summary);

        assert_eq!(
            ResultFormatter::new(OutputFormat::Table)
                .format_report(&report)
                .unwrap(),
            None
        );
        assert_eq!(
            ResultFormatter::new(OutputFormat::Summary)
                .format_report(&report)
                .unwrap()
                .as_deref(),
            Some("2 commits: 1 passed, 1 failed in 20ms (50.0% passed)")
        );

        let json = ResultFormatter::new(OutputFormat::Json)
            .format_report(&report)
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["failed"], 1);
        assert!(!OutputFormat::Json.shows_table());

        let pretty = ResultFormatter::new(OutputFormat::JsonPretty)
            .format_report(&report)
            .unwrap()
            .unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(serde_json::from_str::<serde_json::Value>(&pretty).unwrap(), value);
    }
}
