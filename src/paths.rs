//! Path normalization and import resolution.
//!
//! Project files arrive from the upstream generator with loosely normalized
//! paths (`app/page.tsx`, `/components/Header.tsx`, `./lib/utils.ts`). All
//! lookups in the compiler go through [`normalize_path`], and every import
//! specifier is expanded into an ordered candidate list by
//! [`resolve_specifier`]. Resolution never touches the filesystem — matching
//! candidates against the known file set is the caller's job, and a miss is
//! not an error (the import is assumed external).

/// Recognized component-source extensions, in candidate order.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

/// Alias prefix meaning "project root".
pub const ROOT_ALIAS: &str = "@/";

/// Normalize a raw file path: forward slashes only, no leading `/` or `./`,
/// `.`/`..` segments applied. Idempotent and side-effect-free; two files with
/// equal normalized paths are the same logical file.
pub fn normalize_path(raw: &str) -> String {
    let slashed = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in slashed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Whether a path ends in one of the recognized source extensions.
pub fn has_source_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => SOURCE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Directory portion of a normalized path ("" for root-level files).
fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Expand an import specifier found in `from_path` into the ordered list of
/// file-path candidates that could satisfy it:
///
/// - relative (`./x`, `../x`): resolved against the directory of `from_path`
/// - alias (`@/x`) and root-absolute (`/x`): resolved against the project
///   root, with and without a leading `src/` (generators differ on whether
///   they emit it)
/// - bare `components/...`: tried at `components/` and `src/components/`
/// - anything else: an external package — no candidates
///
/// Each base without an explicit extension expands to the exact path, then
/// the path plus each extension, then the `/index` form with each extension.
pub fn resolve_specifier(from_path: &str, specifier: &str) -> Vec<String> {
    let bases: Vec<String> = if specifier.starts_with('.') {
        let joined = format!("{}/{}", parent_dir(&normalize_path(from_path)), specifier);
        vec![normalize_path(&joined)]
    } else if let Some(rest) = specifier.strip_prefix(ROOT_ALIAS) {
        vec![normalize_path(rest), normalize_path(&format!("src/{rest}"))]
    } else if let Some(rest) = specifier.strip_prefix('/') {
        vec![normalize_path(rest), normalize_path(&format!("src/{rest}"))]
    } else if specifier == "components" || specifier.starts_with("components/") {
        vec![
            normalize_path(specifier),
            normalize_path(&format!("src/{specifier}")),
        ]
    } else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for base in bases {
        if base.is_empty() {
            continue;
        }
        if has_source_extension(&base) {
            candidates.push(base);
            continue;
        }
        candidates.push(base.clone());
        for ext in SOURCE_EXTENSIONS {
            candidates.push(format!("{base}.{ext}"));
        }
        for ext in SOURCE_EXTENSIONS {
            candidates.push(format!("{base}/index.{ext}"));
        }
    }
    candidates
}
