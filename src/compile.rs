//! The export pipeline.
//!
//! Orchestrates one compile invocation: normalize the incoming file tree,
//! discover the home page and every sub-page, locate shared chrome, compute
//! each page's dependency closure, sanitize and assemble its bundle, and
//! wrap everything into one document per page. Pages compile in parallel —
//! all state is local to the invocation and inputs are immutable — but the
//! returned documents are always in route order (home first, then sub-pages
//! sorted by slug).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::assemble::{assemble, detect_root_component, page_references_tag, CompositionPlan, FragmentSet};
use crate::collect::collect_closure;
use crate::config::{collect_icon_definitions, extract_theme_config, icon_preamble_js};
use crate::document::{build_document, DocumentInput};
use crate::paths::{normalize_path, SOURCE_EXTENSIONS};
use crate::sanitize::sanitize;
use crate::shim::DEFAULT_SHIM_RETRY_LIMIT;
use crate::{ExportError, OutputDocument, ProjectFile};

lazy_static! {
    /// `app/<slug>/page.<ext>` — one path segment per additional page.
    static ref SUB_PAGE_RE: Regex =
        Regex::new(r"^(?:src/)?app/([A-Za-z0-9_-]+)/page\.(?:tsx|ts|jsx|js)$").unwrap();
}

/// Directories under `app/` that hold support code, never pages.
const NON_PAGE_SEGMENTS: [&str; 3] = ["components", "api", "lib"];

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// Input contract: the ordered file list, an optional site title, and an
/// optional dependency-version map the compiler ignores but passes through
/// unchanged for upstream packaging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub site_title: Option<String>,
    #[serde(default)]
    pub dependencies: Option<serde_json::Value>,
}

/// Output contract: one document per page plus the untouched dependency map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub documents: Vec<OutputDocument>,
    #[serde(default)]
    pub dependencies: Option<serde_json::Value>,
}

/// Map a route path to its relative output file:
/// `/` → `index.html`, `/about` → `about/index.html`.
pub fn route_to_output_path(route_path: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for segment in route_path.split('/').filter(|s| !s.is_empty()) {
        out.push(segment);
    }
    out.push("index.html");
    out
}

/// Write documents under `out_dir` using the route mapping.
pub fn write_documents(out_dir: &Path, documents: &[OutputDocument]) -> Result<(), ExportError> {
    for doc in documents {
        let html_path = out_dir.join(route_to_output_path(&doc.route_path));
        if let Some(parent) = html_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&html_path, &doc.html)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

struct PageEntry<'a> {
    route: String,
    title: String,
    file: &'a ProjectFile,
}

/// Compile a project into its static documents.
pub fn compile_project(request: &ExportRequest) -> Result<ExportResult, ExportError> {
    // Normalize paths up front; first occurrence of a logical file wins.
    let mut files: BTreeMap<String, ProjectFile> = BTreeMap::new();
    for file in &request.files {
        let path = normalize_path(&file.path);
        if path.is_empty() {
            continue;
        }
        files.entry(path.clone()).or_insert_with(|| ProjectFile {
            path,
            content: file.content.clone(),
        });
    }

    let home = find_entry(&files, &["app/page", "src/app/page", "page"])
        .ok_or(ExportError::MissingEntryPage)?;

    let mut pages: Vec<PageEntry<'_>> = vec![PageEntry {
        route: "/".to_string(),
        title: request
            .site_title
            .clone()
            .unwrap_or_else(|| "Home".to_string()),
        file: home,
    }];
    for (path, file) in &files {
        let Some(cap) = SUB_PAGE_RE.captures(path) else {
            continue;
        };
        let slug = cap[1].to_string();
        if NON_PAGE_SEGMENTS.contains(&slug.as_str()) {
            continue;
        }
        let humanized = humanize_slug(&slug);
        let title = match &request.site_title {
            Some(site) => format!("{humanized} | {site}"),
            None => humanized,
        };
        pages.push(PageEntry {
            route: format!("/{slug}"),
            title,
            file,
        });
    }

    let header = find_entry(
        &files,
        &[
            "components/Header",
            "app/components/Header",
            "src/components/Header",
        ],
    );
    let footer = find_entry(
        &files,
        &[
            "components/Footer",
            "app/components/Footer",
            "src/components/Footer",
        ],
    );

    let styles = files
        .values()
        .filter(|f| f.path.ends_with(".css"))
        .map(|f| f.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let theme_config = extract_theme_config(&files);
    let icons = collect_icon_definitions(&files);
    let icon_preamble = icon_preamble_js(&icons);

    let documents: Vec<OutputDocument> = pages
        .par_iter()
        .map(|page| {
            compile_page(
                &files,
                page,
                header,
                footer,
                &styles,
                &theme_config,
                &icon_preamble,
            )
        })
        .collect();

    Ok(ExportResult {
        documents,
        dependencies: request.dependencies.clone(),
    })
}

fn compile_page(
    files: &BTreeMap<String, ProjectFile>,
    page: &PageEntry<'_>,
    header: Option<&ProjectFile>,
    footer: Option<&ProjectFile>,
    styles: &str,
    theme_config: &str,
    icon_preamble: &str,
) -> OutputDocument {
    let mut entries: Vec<&ProjectFile> = vec![page.file];
    entries.extend(header);
    entries.extend(footer);

    let closure = collect_closure(files, &entries);

    let fragments = FragmentSet {
        header: header.map(|f| sanitize(&f.content)),
        footer: footer.map(|f| sanitize(&f.content)),
        dependencies: closure.iter().map(|f| sanitize(&f.content)).collect(),
        page: sanitize(&page.file.content),
    };

    let plan = CompositionPlan {
        root_component: detect_root_component(&page.file.content),
        wrap_header: header.is_some() && !page_references_tag(&page.file.content, "Header"),
        wrap_footer: footer.is_some() && !page_references_tag(&page.file.content, "Footer"),
    };

    let bundle = assemble(&fragments, &plan);

    build_document(&DocumentInput {
        bundle: &bundle,
        title: &page.title,
        route_path: &page.route,
        styles,
        theme_config,
        icon_preamble,
        retry_limit: DEFAULT_SHIM_RETRY_LIMIT,
    })
}

/// First file matching any `base` + recognized extension, in base order.
fn find_entry<'a>(
    files: &'a BTreeMap<String, ProjectFile>,
    bases: &[&str],
) -> Option<&'a ProjectFile> {
    for base in bases {
        for ext in SOURCE_EXTENSIONS {
            if let Some(file) = files.get(&format!("{base}.{ext}")) {
                return Some(file);
            }
        }
    }
    None
}

/// `about-us` → `About Us`
fn humanize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
