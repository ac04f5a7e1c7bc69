//! Rendering of run reports for the terminal and for machines

use crate::util;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use freeze_core::tree::display_key;
use freeze_core::{PathKey, RunReport};
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Write;
use std::path::Path;

/// Applies styles only when colour output is enabled
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Human-readable report: modified, deleted, then added, and a total line
pub fn render_text(report: &RunReport, palette: Palette, now: DateTime<Utc>) -> String {
    let yellow = Style::new().yellow();
    let red = Style::new().red();
    let green = Style::new().green();
    let dimmed = Style::new().dimmed();

    let mut out = String::new();
    let diff = &report.diff;

    match &report.previous {
        Some(previous) => {
            let when = util::format_relative_time(previous.name.timestamp(), now);
            let _ = writeln!(
                out,
                "Compared with {} {}",
                palette.paint(&previous.name.to_string(), yellow),
                palette.paint(&format!("({when})"), dimmed)
            );
        }
        None => {
            let _ = writeln!(
                out,
                "{}",
                palette.paint("No previous snapshot, every file is new", dimmed)
            );
        }
    }
    out.push('\n');

    if diff.is_empty() {
        let _ = writeln!(out, "{}", palette.paint("No changes", dimmed));
    } else {
        section(&mut out, palette, "M", "Modified", "~", yellow, &diff.modified);
        section(&mut out, palette, "D", "Deleted", "-", red, &diff.deleted);
        section(&mut out, palette, "A", "Added", "+", green, &diff.added);

        let total = format!(
            "Total: {} added, {} deleted, {} modified",
            palette.paint(&diff.added.len().to_string(), green),
            palette.paint(&diff.deleted.len().to_string(), red),
            palette.paint(&diff.modified.len().to_string(), yellow),
        );
        let _ = writeln!(out, "{}", palette.paint(&total, dimmed));
    }

    if !report.skipped.is_empty() {
        let _ = writeln!(
            out,
            "{} {} {} could not be read",
            palette.paint("!", red),
            report.skipped.len(),
            util::files(report.skipped.len())
        );
    }

    match &report.snapshot {
        Some(snapshot) => {
            let _ = writeln!(
                out,
                "Snapshot {} written ({} {})",
                palette.paint(&snapshot.name.to_string(), yellow),
                report.files,
                util::files(report.files)
            );
        }
        None => {
            let _ = writeln!(out, "{}", palette.paint("Dry run, no snapshot written", dimmed));
        }
    }

    out
}

fn section(
    out: &mut String,
    palette: Palette,
    letter: &str,
    title: &str,
    marker: &str,
    style: Style,
    paths: &[PathKey],
) {
    if paths.is_empty() {
        return;
    }

    let _ = writeln!(
        out,
        "{} {} ({} {})",
        palette.paint(letter, style.bold()),
        title,
        paths.len(),
        util::files(paths.len())
    );
    for path in paths {
        let _ = writeln!(out, "  {} {}", palette.paint(marker, style), display_key(path));
    }
    out.push('\n');
}

#[derive(Serialize)]
struct JsonReport<'a> {
    root: Cow<'a, str>,
    previous_snapshot: Option<String>,
    snapshot: Option<String>,
    added: Vec<Cow<'a, str>>,
    deleted: Vec<Cow<'a, str>>,
    modified: Vec<Cow<'a, str>>,
    skipped: Vec<JsonSkipped<'a>>,
}

#[derive(Serialize)]
struct JsonSkipped<'a> {
    path: Cow<'a, str>,
    reason: &'a str,
}

/// Path bytes as JSON text; invalid UTF-8 is written with `\xNN` escapes
fn json_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.escape_ascii().to_string()),
    }
}

fn json_path(path: &Path) -> Cow<'_, str> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        json_text(path.as_os_str().as_bytes())
    }
    #[cfg(not(unix))]
    {
        path.to_string_lossy()
    }
}

fn json_paths(paths: &[PathKey]) -> Vec<Cow<'_, str>> {
    paths.iter().map(|p| json_text(p)).collect()
}

/// Machine-readable report
///
/// Valid UTF-8 paths are emitted verbatim. Other names are emitted with
/// every byte outside printable ASCII as `\xNN` (and `\` doubled), so two
/// distinct non-UTF-8 names never render to the same string.
pub fn render_json(report: &RunReport) -> Result<String> {
    let json = JsonReport {
        root: json_path(&report.root),
        previous_snapshot: report.previous.as_ref().map(|s| s.name.to_string()),
        snapshot: report.snapshot.as_ref().map(|s| s.name.to_string()),
        added: json_paths(&report.diff.added),
        deleted: json_paths(&report.diff.deleted),
        modified: json_paths(&report.diff.modified),
        skipped: report
            .skipped
            .iter()
            .map(|s| JsonSkipped {
                path: json_path(&s.path),
                reason: &s.reason,
            })
            .collect(),
    };

    serde_json::to_string_pretty(&json).context("Failed to serialize report")
}
