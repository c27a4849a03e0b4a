use std::path::{Component, Path, PathBuf};

/// Extensions that mark a specifier as explicit even when they are not scan targets.
const RESOURCE_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".mts", ".cts", ".json", ".vue", ".svelte",
    ".astro", ".css", ".scss", ".sass", ".less", ".html", ".htm", ".svg", ".png", ".jpg",
    ".jpeg", ".gif", ".webp", ".avif", ".ico", ".bmp", ".woff", ".woff2", ".ttf", ".otf",
    ".eot", ".mp4", ".webm", ".mp3", ".wav", ".txt", ".md",
];

/// The outcome of resolving a single specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Resolved to an existing regular file.
    Resolved(PathBuf),
    /// Nothing on disk matched. The reason is for diagnostics only.
    Unresolved(&'static str),
}

impl ResolutionOutcome {
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            ResolutionOutcome::Resolved(p) => Some(p),
            ResolutionOutcome::Unresolved(_) => None,
        }
    }
}

/// Resolve `specifier` relative to `base_dir`.
///
/// Precedence, first hit wins:
/// 1. A specifier with a recognized extension is checked as written and never
///    rewritten to another extension.
/// 2. Otherwise, for each candidate in order: `base/specifier + ext`, then
///    `base/specifier/index + ext`. A specifier that names a directory
///    (`..`, `./`, `../lib/`) only gets the index lookup.
///
/// Only regular files are valid results; a directory never is.
pub fn resolve_specifier(
    base_dir: &Path,
    specifier: &str,
    candidates: &[String],
) -> ResolutionOutcome {
    let target = normalize_path(&base_dir.join(specifier));

    if has_recognized_extension(specifier, candidates) {
        return if is_regular_file(&target) {
            ResolutionOutcome::Resolved(target)
        } else {
            ResolutionOutcome::Unresolved("explicit extension, file missing")
        };
    }

    if candidates.is_empty() {
        return ResolutionOutcome::Unresolved("no candidate extensions");
    }

    let directory_only = names_directory(specifier);
    let stem = target.as_os_str().to_string_lossy().into_owned();
    for ext in candidates {
        let direct = PathBuf::from(format!("{stem}{ext}"));
        if !directory_only && is_regular_file(&direct) {
            return ResolutionOutcome::Resolved(direct);
        }

        let index = target.join(format!("index{ext}"));
        if is_regular_file(&index) {
            return ResolutionOutcome::Resolved(index);
        }
    }

    ResolutionOutcome::Unresolved("no candidate matched")
}

/// Whether the last segment of `specifier` ends in a candidate or known resource extension.
pub fn has_recognized_extension(specifier: &str, candidates: &[String]) -> bool {
    let file_name = specifier.rsplit(['/', '\\']).next().unwrap_or(specifier);
    let Some(dot) = file_name.rfind('.') else {
        return false;
    };
    // `.` and `..` segments, and dotfiles like `.env`, carry no extension.
    if dot == 0 {
        return false;
    }
    let ext = file_name[dot..].to_lowercase();
    candidates.iter().any(|c| *c == ext) || RESOURCE_EXTENSIONS.contains(&ext.as_str())
}

/// Whether `specifier` ends in a separator or a `.`/`..` segment.
fn names_directory(specifier: &str) -> bool {
    if specifier.ends_with(['/', '\\']) {
        return true;
    }
    let last = specifier.rsplit(['/', '\\']).next().unwrap_or(specifier);
    last == "." || last == ".."
}

fn is_regular_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Lexically normalize a path: drop `.` components and fold `..` into its parent.
///
/// Does not touch the file system, so symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
