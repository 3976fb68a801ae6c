//! Dependency collection.
//!
//! Breadth-first traversal over import edges starting from a page's entry
//! files, producing the transitive closure of same-project files the bundle
//! must include. Specifiers are expanded by [`crate::paths::resolve_specifier`]
//! and matched first-match-wins against the known file set; a miss means the
//! import is external and is skipped silently. A visited set keyed on
//! normalized paths guarantees termination on cyclic graphs, and the closure
//! is returned sorted by path so bundle output is deterministic.

use std::collections::{BTreeMap, HashSet, VecDeque};

use lazy_static::lazy_static;
use regex::Regex;

use crate::paths::{has_source_extension, resolve_specifier};
use crate::ProjectFile;

lazy_static! {
    /// `import ... from '...'` (body may span lines).
    static ref IMPORT_FROM_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s(?:[^;]*?)\bfrom\s*['"]([^'"]+)['"]"#).unwrap();

    /// `export ... from '...'` re-export edges still pull the file in.
    static ref EXPORT_FROM_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*export\s(?:[^;]*?)\bfrom\s*['"]([^'"]+)['"]"#).unwrap();

    /// Bare side-effect import.
    static ref IMPORT_SIDE_EFFECT_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s*['"]([^'"]+)['"]"#).unwrap();
}

/// Every import specifier appearing in a file's raw text.
pub fn scan_import_specifiers(content: &str) -> Vec<String> {
    let mut specifiers = Vec::new();
    for re in [&*IMPORT_FROM_RE, &*EXPORT_FROM_RE, &*IMPORT_SIDE_EFFECT_RE] {
        for cap in re.captures_iter(content) {
            if let Some(m) = cap.get(1) {
                specifiers.push(m.as_str().to_string());
            }
        }
    }
    specifiers
}

/// Resolve one specifier against the known file set. First candidate wins;
/// `None` means external/unavailable.
pub fn match_candidate<'a>(
    files: &'a BTreeMap<String, ProjectFile>,
    from_path: &str,
    specifier: &str,
) -> Option<&'a ProjectFile> {
    for candidate in resolve_specifier(from_path, specifier) {
        if let Some(file) = files.get(&candidate) {
            return Some(file);
        }
    }
    None
}

/// Compute the dependency closure reachable from `entries`. Entry files
/// themselves are excluded from the result — they are tracked by role
/// (chrome / page) by the caller. Only component-source files are followed;
/// resolved style or data targets are ignored by this traversal.
pub fn collect_closure<'a>(
    files: &'a BTreeMap<String, ProjectFile>,
    entries: &[&'a ProjectFile],
) -> Vec<&'a ProjectFile> {
    let mut visited: HashSet<String> = entries.iter().map(|f| f.path.clone()).collect();
    let mut queue: VecDeque<&ProjectFile> = entries.iter().copied().collect();
    let mut collected: BTreeMap<String, &ProjectFile> = BTreeMap::new();
    let entry_paths: HashSet<&str> = entries.iter().map(|f| f.path.as_str()).collect();

    while let Some(file) = queue.pop_front() {
        for specifier in scan_import_specifiers(&file.content) {
            let Some(target) = match_candidate(files, &file.path, &specifier) else {
                continue;
            };
            if !has_source_extension(&target.path) {
                continue;
            }
            if !entry_paths.contains(target.path.as_str()) {
                collected.insert(target.path.clone(), target);
            }
            if visited.insert(target.path.clone()) {
                queue.push_back(target);
            }
        }
    }

    collected.into_values().collect()
}
