//! Command-line exporter.
//!
//! Loads a project either from a directory tree (`--project <dir>`) or as a
//! JSON payload on stdin, compiles every page, and writes the documents
//! under `--out-dir` using the `/` → `index.html`, `/<slug>` →
//! `<slug>/index.html` mapping. A content-hash cache skips rewriting
//! documents whose inputs did not change; `--no-cache` disables it.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use lumen_export::cache::ExportCache;
use lumen_export::{
    compile_project, route_to_output_path, write_documents, ExportRequest, ProjectFile,
};

const USAGE: &str =
    "usage: lumen-export --out-dir <path> [--project <dir>] [--title <title>] [--no-cache]";

struct Cli {
    project: Option<PathBuf>,
    out_dir: PathBuf,
    title: Option<String>,
    no_cache: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("[lumen-export] {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = parse_args()?;

    let mut request = match &cli.project {
        Some(dir) => load_project(dir)?,
        None => read_stdin_request()?,
    };
    if cli.title.is_some() {
        request.site_title = cli.title.clone();
    }

    // One fingerprint over every compile input; any change invalidates all
    // routes at once.
    let title = request.site_title.clone().unwrap_or_default();
    let mut parts: Vec<&str> = Vec::with_capacity(request.files.len() * 2 + 1);
    for file in &request.files {
        parts.push(&file.path);
        parts.push(&file.content);
    }
    parts.push(&title);
    let fingerprint = ExportCache::fingerprint(&parts);

    let result = compile_project(&request)?;

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create output dir '{}'", cli.out_dir.display()))?;

    let mut written = result.documents.len();
    let mut unchanged = 0usize;
    if cli.no_cache {
        write_documents(&cli.out_dir, &result.documents)
            .with_context(|| format!("failed to write to '{}'", cli.out_dir.display()))?;
    } else {
        let cache = ExportCache::new();
        written = 0;
        for doc in &result.documents {
            let html_path = cli.out_dir.join(route_to_output_path(&doc.route_path));
            let cached = cache.get(&doc.route_path, &fingerprint);
            if cached.as_deref() == Some(doc.html.as_str()) && html_path.exists() {
                unchanged += 1;
                continue;
            }
            if let Some(parent) = html_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create dir '{}'", parent.display()))?;
            }
            fs::write(&html_path, &doc.html)
                .with_context(|| format!("failed to write '{}'", html_path.display()))?;
            cache.set(&doc.route_path, &fingerprint, &doc.html);
            written += 1;
        }
    }

    eprintln!(
        "[lumen-export] {} documents ({} written, {} unchanged) -> {}",
        result.documents.len(),
        written,
        unchanged,
        cli.out_dir.display()
    );
    if let Some(deps) = &result.dependencies {
        let count = deps.as_object().map_or(0, |o| o.len());
        eprintln!("[lumen-export] dependency manifest passed through ({count} entries)");
    }

    Ok(())
}

fn parse_args() -> Result<Cli> {
    let mut project = None;
    let mut out_dir = None;
    let mut title = None;
    let mut no_cache = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--project" => {
                let value = args.next().context("missing value for --project")?;
                project = Some(PathBuf::from(value));
            }
            "--out-dir" => {
                let value = args.next().context("missing value for --out-dir")?;
                out_dir = Some(PathBuf::from(value));
            }
            "--title" => {
                title = Some(args.next().context("missing value for --title")?);
            }
            "--no-cache" => no_cache = true,
            other => bail!("unknown argument '{other}'. {USAGE}"),
        }
    }

    Ok(Cli {
        project,
        out_dir: out_dir.with_context(|| format!("required flag missing: --out-dir. {USAGE}"))?,
        title,
        no_cache,
    })
}

/// File extensions the exporter picks up from a project directory.
const LOADED_EXTENSIONS: [&str; 5] = ["tsx", "ts", "jsx", "js", "css"];

/// Directories that never contain project sources.
const SKIPPED_DIRS: [&str; 4] = ["node_modules", ".git", "dist", ".lumen"];

fn load_project(dir: &Path) -> Result<ExportRequest> {
    if !dir.is_dir() {
        bail!("project dir '{}' does not exist", dir.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir).follow_links(true).into_iter();
    for entry in walker.filter_entry(|e| {
        e.file_name()
            .to_str()
            .map(|name| !SKIPPED_DIRS.contains(&name))
            .unwrap_or(true)
    }) {
        let entry = entry.with_context(|| format!("failed to walk '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || !is_project_file(path) {
            continue;
        }
        let rel = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        match fs::read_to_string(path) {
            Ok(content) => files.push(ProjectFile { path: rel, content }),
            Err(err) => {
                eprintln!("[lumen-export] skipping unreadable file '{rel}': {err}");
            }
        }
    }

    let dependencies = files
        .iter()
        .find(|f| f.path == "package.json" || f.path.ends_with("/package.json"))
        .and_then(|f| serde_json::from_str::<serde_json::Value>(&f.content).ok())
        .and_then(|manifest| manifest.get("dependencies").cloned());

    Ok(ExportRequest {
        files,
        site_title: None,
        dependencies,
    })
}

fn is_project_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name == "package.json" || name.starts_with("tailwind.config.") {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| LOADED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn read_stdin_request() -> Result<ExportRequest> {
    let mut payload = String::new();
    io::stdin()
        .read_to_string(&mut payload)
        .context("failed to read stdin")?;
    if payload.trim().is_empty() {
        bail!("stdin payload is empty (pass --project <dir> or pipe a JSON payload)");
    }
    serde_json::from_str(&payload).context("invalid input JSON")
}
