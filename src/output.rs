//! CLI output formatting for every task.
//!
//! # Information-First Display
//!
//! Reports lead with what was produced (table, version) and show file names
//! as indented context, so a build log reads as an inventory of the
//! definitions directory.
//!
//! # Output Format
//!
//! ## Static
//!
//! ```text
//! Static
//!     14 files copied
//! Tables → docs/definitions
//! 001 DeepsightAdeptDefinition
//!     DeepsightAdeptDefinition.json
//! 002 DeepsightItemSourceDefinition
//!     DeepsightItemSourceListDefinition.json
//!     DeepsightItemSourceDefinition.json
//!
//! Built 2 tables, 3 files in 1.42s
//! ```
//!
//! ## Bump versions
//!
//! ```text
//! Bumped
//!     DeepsightAdeptDefinition → 0
//!     Enums → 4
//! deepsight → 12 (package 1.0.12)
//! ```
//!
//! # Architecture
//!
//! Each task has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::pipeline::BuildReport;
use crate::tables::enums::PruneReport;
use crate::versions::{BumpReport, base36};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// A version as a number with its base 36 form, `1736294400012 (M5N4UTCC)`.
fn format_version(version: i64) -> String {
    if (0..36).contains(&version) {
        version.to_string()
    } else {
        format!("{version} ({})", base36(version))
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Static
// ============================================================================

pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![
        "Static".to_string(),
        format!("{}{} copied", indent(1), plural(report.static_files, "file")),
        format!("Tables → {}", report.definitions_dir.display()),
    ];

    let mut files = 0;
    for (index, table) in report.tables.iter().enumerate() {
        lines.push(format!("{} {}", format_index(index + 1), table.table));
        for file in &table.files {
            lines.push(format!("{}{}", indent(1), file));
        }
        files += table.files.len();
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {}, {} in {:.2?}",
        plural(report.tables.len(), "table"),
        plural(files, "file"),
        report.elapsed
    ));
    lines
}

pub fn print_build_report(report: &BuildReport) {
    print_lines(format_build_report(report));
}

// ============================================================================
// Bump versions
// ============================================================================

pub fn format_bump_report(report: &BumpReport) -> Vec<String> {
    if report.bumped.is_empty() {
        return vec!["No table changed, versions unchanged".to_string()];
    }

    let mut lines = vec!["Bumped".to_string()];
    for (table, version) in &report.bumped {
        lines.push(format!("{}{} → {}", indent(1), table, format_version(*version)));
    }
    if let Some(deepsight) = report.deepsight {
        let package = report
            .package_version
            .as_deref()
            .map(|version| format!(" (package {version})"))
            .unwrap_or_default();
        lines.push(format!("deepsight → {}{package}", format_version(deepsight)));
    }
    lines
}

pub fn print_bump_report(report: &BumpReport) {
    print_lines(format_bump_report(report));
}

// ============================================================================
// Other tasks
// ============================================================================

pub fn format_prune_report(report: &PruneReport) -> Vec<String> {
    vec![format!(
        "InventoryItemHashes pruned: kept {} of {}",
        report.kept,
        plural(report.total, "member")
    )]
}

pub fn print_prune_report(report: &PruneReport) {
    print_lines(format_prune_report(report));
}

pub fn format_clean(output_dir: &Path, removed: bool) -> Vec<String> {
    if removed {
        vec![format!("Removed {}", output_dir.display())]
    } else {
        vec![format!("Nothing to clean, {} does not exist", output_dir.display())]
    }
}

pub fn print_clean(output_dir: &Path, removed: bool) {
    print_lines(format_clean(output_dir, removed));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TableReport;
    use crate::tables::TableKind;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
        assert_eq!(plural(3, "table"), "3 tables");
    }

    #[test]
    fn versions_show_base36_when_long() {
        assert_eq!(format_version(7), "7");
        assert_eq!(format_version(36), "36 (10)");
        assert_eq!(format_version(-1), "-1 (-1)");
    }

    #[test]
    fn build_report_lists_tables_and_files() {
        let report = BuildReport {
            static_files: 1,
            tables: vec![
                TableReport {
                    table: TableKind::Adept,
                    files: vec!["DeepsightAdeptDefinition.json".into()],
                },
                TableReport {
                    table: TableKind::ItemSources,
                    files: vec![
                        "DeepsightItemSourceListDefinition.json".into(),
                        "DeepsightItemSourceDefinition.json".into(),
                    ],
                },
            ],
            definitions_dir: PathBuf::from("docs/definitions"),
            elapsed: Duration::from_millis(1500),
        };
        let lines = format_build_report(&report);
        assert_eq!(lines[0], "Static");
        assert_eq!(lines[1], "    1 file copied");
        assert_eq!(lines[2], "Tables → docs/definitions");
        assert_eq!(lines[3], "001 DeepsightAdeptDefinition");
        assert_eq!(lines[4], "    DeepsightAdeptDefinition.json");
        assert_eq!(lines[5], "002 DeepsightItemSourceDefinition");
        assert_eq!(lines[8], "");
        assert_eq!(lines[9], "Built 2 tables, 3 files in 1.50s");
    }

    #[test]
    fn bump_report_lines() {
        let report = BumpReport {
            bumped: vec![("Enums".into(), 4)],
            deepsight: Some(12),
            package_version: Some("1.0.12".into()),
        };
        assert_eq!(
            format_bump_report(&report),
            vec!["Bumped", "    Enums → 4", "deepsight → 12 (package 1.0.12)"]
        );
        assert_eq!(
            format_bump_report(&BumpReport::default()),
            vec!["No table changed, versions unchanged"]
        );
    }

    #[test]
    fn prune_and_clean_lines() {
        assert_eq!(
            format_prune_report(&PruneReport { kept: 2, total: 3 }),
            vec!["InventoryItemHashes pruned: kept 2 of 3 members"]
        );
        assert_eq!(format_clean(Path::new("docs"), true), vec!["Removed docs"]);
    }
}
