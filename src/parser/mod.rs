pub mod rules;

use std::collections::BTreeSet;

use crate::language::FileClass;

use rules::rules_for;

/// Extract the raw relative specifiers referenced by `content`.
///
/// Applies every registry rule whose scope covers `class`. Only specifiers that
/// start with `.` or `/` survive; package-style references are dropped here, so
/// they can never become edges. Query strings and fragments are stripped.
///
/// Pure text transform: no file-system access, never fails.
pub fn extract_imports(content: &str, class: FileClass) -> BTreeSet<String> {
    let mut specifiers = BTreeSet::new();

    for rule in rules_for(class) {
        for raw in rule.captures(content) {
            if let Some(spec) = clean_specifier(raw) {
                tracing::trace!(
                    rule = rule.spec.name,
                    category = ?rule.spec.category,
                    "matched '{spec}'"
                );
                specifiers.insert(spec.to_owned());
            }
        }
    }

    specifiers
}

/// Returns true for specifiers that point into the file system (`./x`, `../x`, `/x`).
///
/// Protocol-relative URLs (`//cdn.example.com/x.js`) are not file references.
pub fn is_relative_specifier(specifier: &str) -> bool {
    (specifier.starts_with('.') || specifier.starts_with('/')) && !specifier.starts_with("//")
}

/// Trim whitespace, drop `?query`/`#fragment` suffixes, and reject non-relative specifiers.
fn clean_specifier(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if !is_relative_specifier(trimmed) {
        return None;
    }
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let cleaned = &trimmed[..end];
    if cleaned.is_empty() || cleaned == "." || cleaned == "/" {
        return None;
    }
    Some(cleaned)
}
