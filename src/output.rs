use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use filedep::engine::DependencyView;
use filedep::graph::directory::DirectoryEntry;
use filedep::pipeline::ScanStats;

use crate::cli::OutputFormat;

/// Print a summary of a scan.
///
/// JSON goes to stdout as one object. Otherwise a cargo-style summary is
/// printed; skipped files are reported through the log so stdout stays clean.
pub fn print_summary(stats: &ScanStats, format: OutputFormat) {
    if format == OutputFormat::Json {
        match serde_json::to_string_pretty(stats) {
            Ok(s) => println!("{s}"),
            Err(e) => tracing::error!("error serialising stats: {e}"),
        }
        return;
    }

    println!(
        "Scanned {} files in {:.2}s ({} roots)",
        stats.files, stats.elapsed_secs, stats.roots
    );
    println!(
        "  {} dependencies, {} unresolved, {} isolated files, {} directories",
        stats.edges, stats.unresolved, stats.isolated, stats.directories
    );
    if stats.unreadable > 0 || stats.oversized > 0 {
        tracing::warn!(
            "{} files unreadable, {} over the size limit (kept without edges)",
            stats.unreadable,
            stats.oversized
        );
    }
}

/// Display a path relative to the first root that contains it.
pub fn display_path(path: &Path, roots: &[PathBuf]) -> String {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[derive(Serialize)]
struct DependencyRow {
    file: String,
    dependencies: Vec<String>,
}

fn dependency_rows(view: &DependencyView, roots: &[PathBuf]) -> Vec<DependencyRow> {
    view.iter()
        .map(|(file, deps)| DependencyRow {
            file: display_path(file, roots),
            dependencies: deps.iter().map(|d| display_path(d, roots)).collect(),
        })
        .collect()
}

/// Print a filtered dependency (or dependents) mapping.
pub fn print_dependencies(view: &DependencyView, roots: &[PathBuf], format: OutputFormat) {
    let rows = dependency_rows(view, roots);
    let mut out = io::stdout().lock();
    let result = match format {
        OutputFormat::Json => write_json(&mut out, &rows),
        OutputFormat::Compact => write_dependencies_compact(&mut out, &rows),
        OutputFormat::Table => write_dependencies_table(&mut out, &rows),
    };
    if let Err(e) = result {
        tracing::error!("failed to write output: {e}");
    }
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn write_dependencies_compact(out: &mut impl Write, rows: &[DependencyRow]) -> io::Result<()> {
    for row in rows {
        if row.dependencies.is_empty() {
            writeln!(out, "{}", row.file)?;
        } else {
            writeln!(out, "{} -> {}", row.file, row.dependencies.join(", "))?;
        }
    }
    Ok(())
}

fn write_dependencies_table(out: &mut impl Write, rows: &[DependencyRow]) -> io::Result<()> {
    let width = rows
        .iter()
        .map(|r| r.file.len())
        .max()
        .unwrap_or(0)
        .max("FILE".len());
    let bold = io::stdout().is_terminal();
    let header = format!("{:<width$}  DEPENDENCIES", "FILE");
    if bold {
        writeln!(out, "\x1b[1m{header}\x1b[0m")?;
    } else {
        writeln!(out, "{header}")?;
    }
    for row in rows {
        let deps = if row.dependencies.is_empty() {
            "-".to_string()
        } else {
            row.dependencies.join(", ")
        };
        writeln!(out, "{:<width$}  {}", row.file, deps)?;
    }
    Ok(())
}

/// Print the directory filter tree.
pub fn print_directories(entries: &[DirectoryEntry], format: OutputFormat) {
    let mut out = io::stdout().lock();
    let result = match format {
        OutputFormat::Json => write_json(&mut out, &entries),
        OutputFormat::Compact | OutputFormat::Table => write_directories_tree(&mut out, entries),
    };
    if let Err(e) = result {
        tracing::error!("failed to write output: {e}");
    }
}

fn write_directories_tree(out: &mut impl Write, entries: &[DirectoryEntry]) -> io::Result<()> {
    // Depth-sorted input; re-sort by path so children follow their parent.
    let mut sorted: Vec<&DirectoryEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.path.split('/').cmp(b.path.split('/')));
    for entry in sorted {
        let depth = if entry.path.is_empty() {
            0
        } else {
            entry.path.split('/').count()
        };
        let name = entry.path.rsplit('/').next().unwrap_or("");
        let name = if entry.path.is_empty() { "." } else { name };
        let mark = if entry.enabled { "[x]" } else { "[ ]" };
        writeln!(out, "{}{} {}", "  ".repeat(depth), mark, name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<DependencyRow> {
        vec![
            DependencyRow {
                file: "src/a.ts".into(),
                dependencies: vec!["src/b.ts".into(), "src/c/index.ts".into()],
            },
            DependencyRow {
                file: "src/b.ts".into(),
                dependencies: vec![],
            },
        ]
    }

    #[test]
    fn test_compact_output() {
        let mut buf = Vec::new();
        write_dependencies_compact(&mut buf, &rows()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "src/a.ts -> src/b.ts, src/c/index.ts\nsrc/b.ts\n"
        );
    }

    #[test]
    fn test_directory_tree_output() {
        let entries = vec![
            DirectoryEntry {
                path: "".into(),
                enabled: true,
            },
            DirectoryEntry {
                path: "src".into(),
                enabled: true,
            },
            DirectoryEntry {
                path: "zeta".into(),
                enabled: true,
            },
            DirectoryEntry {
                path: "src/c".into(),
                enabled: false,
            },
        ];
        let mut buf = Vec::new();
        write_directories_tree(&mut buf, &entries).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[x] .\n  [x] src\n    [ ] c\n  [x] zeta\n"
        );
    }

    #[test]
    fn test_display_path_strips_root() {
        let roots = vec![PathBuf::from("/ws")];
        assert_eq!(display_path(Path::new("/ws/src/a.ts"), &roots), "src/a.ts");
        assert_eq!(display_path(Path::new("/other/x.ts"), &roots), "/other/x.ts");
    }
}
