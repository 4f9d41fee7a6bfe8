use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

pub const DEFAULT_REPORT_TEMPLATE: &str = r"# Reward Curve Notebook

<!-- SECTION:overview start -->
<!-- Describe what the run is meant to show about the exploration schedules. -->
<!-- SECTION:overview end -->

## Configuration

<!-- SECTION:configuration start -->
<!-- Populated automatically with the parameters from the latest run. -->
<!-- SECTION:configuration end -->

## Epsilon Schedules

<!-- SECTION:schedules start -->
<!-- Populated automatically with the linear and exponential schedules. -->
<!-- SECTION:schedules end -->

## Rewards

<!-- SECTION:rewards start -->
<!-- Populated automatically with rolling reward summaries. -->
<!-- SECTION:rewards end -->

## Plots

<!-- SECTION:plots start -->
<!-- Rolling mean and standard-deviation plots are embedded here. -->
<!-- SECTION:plots end -->

> Sections may be added or renamed freely. Keep the `<!-- SECTION:name start/end -->`
> markers around any region that should be updated by a run.
";

#[derive(Clone, Debug)]
pub struct ReportSection {
    id: String,
    content: String,
}

impl ReportSection {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    fn start_marker(&self) -> String {
        format!("<!-- SECTION:{} start -->", self.id)
    }

    fn end_marker(&self) -> String {
        format!("<!-- SECTION:{} end -->", self.id)
    }
}

pub fn ensure_report_file(path: &Path, template: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    if !path.exists() {
        fs::write(path, template)
            .with_context(|| format!("failed to write report template to {}", path.display()))?;
        debug!(path = %path.display(), "created report from template");
    }

    Ok(())
}

/// Replace the body of every listed section in the report at `path`.
///
/// Fails without touching the file if any section's markers are missing.
pub fn update_sections(path: &Path, sections: &[ReportSection]) -> Result<()> {
    let mut content = fs::read_to_string(path)
        .with_context(|| format!("failed to read report at {}", path.display()))?;

    for section in sections {
        content = replace_section(&content, section)?;
    }

    fs::write(path, content)
        .with_context(|| format!("failed to write updated report to {}", path.display()))?;
    debug!(path = %path.display(), sections = sections.len(), "updated report");
    Ok(())
}

fn replace_section(content: &str, section: &ReportSection) -> Result<String> {
    let start_marker = section.start_marker();
    let end_marker = section.end_marker();

    let start_idx = content
        .find(&start_marker)
        .ok_or_else(|| anyhow!("missing start marker: {}", start_marker))?;
    let after_start = start_idx + start_marker.len();
    let end_idx = content[after_start..]
        .find(&end_marker)
        .map(|offset| after_start + offset)
        .ok_or_else(|| anyhow!("missing end marker: {}", end_marker))?;

    let body = section.content.trim_matches('\n');
    let mut updated = String::with_capacity(content.len() + body.len());
    updated.push_str(&content[..after_start]);
    updated.push('\n');
    if !body.is_empty() {
        updated.push_str(body);
        updated.push('\n');
    }
    updated.push_str(&content[end_idx..]);
    Ok(updated)
}
