//! `status`: one-shot view of the build slot and the database artifacts.

use std::path::Path;

use anyhow::Result;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

use super::open_coordinator;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{BuildState, StatusReport};

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StatusOutput(pub StatusReport);

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let report = &self.0;
        let db = &report.database;

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Field").add_attribute(Attribute::Bold),
                Cell::new("Value").add_attribute(Attribute::Bold),
            ]);

        table.add_row(vec![
            Cell::new("Build"),
            Cell::new(report.build.as_str()).fg(state_color(&report.build)),
        ]);
        match &report.build {
            BuildState::Running { pid } | BuildState::Stale { pid } => {
                table.add_row(vec!["PID".to_string(), pid.to_string()]);
            }
            BuildState::Error { message } => {
                table.add_row(vec!["Error", message.as_str()]);
            }
            BuildState::Idle => {}
        }

        table.add_row(vec![
            "Database",
            if db.db_exists { db.db_size_formatted.as_str() } else { "missing" },
        ]);
        table.add_row(vec![
            "Archive",
            if db.tar_exists { db.tar_size_formatted.as_str() } else { "missing" },
        ]);
        if let Some(mtime) = &db.db_mtime {
            table.add_row(vec!["Last modified", mtime.as_str()]);
        }
        for (label, key) in [("Updated at", "UpdatedAt"), ("Next update", "NextUpdate")] {
            if let Some(value) = metadata_field(db.metadata.as_ref(), key) {
                table.add_row(vec![label, value]);
            }
        }

        let mut rendered = table.to_string();
        if matches!(report.build, BuildState::Stale { .. }) {
            rendered.push_str("\n\nStale lock detected. Run `trivy-monitor clear-lock` to remove it.");
        }
        rendered
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn metadata_field<'a>(metadata: Option<&'a Value>, key: &str) -> Option<&'a str> {
    metadata?.get(key)?.as_str()
}

const fn state_color(state: &BuildState) -> Color {
    match state {
        BuildState::Idle => Color::Green,
        BuildState::Running { .. } => Color::Cyan,
        BuildState::Stale { .. } => Color::Yellow,
        BuildState::Error { .. } => Color::Red,
    }
}

pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let (_, coordinator) = open_coordinator(config_path)?;
    output(&StatusOutput(coordinator.status().await), json_mode);
    Ok(())
}
