//! Theme configuration and icon definition extraction.
//!
//! Two consumers of the balanced-literal extractor live here. The first
//! pulls the utility-runtime theme configuration object out of the project's
//! `tailwind.config.*` file (direct `export default { ... }`,
//! `module.exports = { ... }`, or an identifier indirection through a local
//! const). The second harvests icon components: names imported from the icon
//! library plus inline icon-factory calls whose vector definition array is
//! extracted verbatim. Extraction failure is never fatal — the document
//! builder falls back to a built-in default config, and icons without vector
//! data render a label-derived generic glyph.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::extract::extract_balanced;
use crate::ProjectFile;

/// Fallback theme configuration when no config file exists or the literal
/// cannot be extracted.
pub const DEFAULT_THEME_CONFIG: &str = "{ theme: { extend: {} } }";

lazy_static! {
    static ref CONFIG_FILE_RE: Regex =
        Regex::new(r"(?:^|/)tailwind\.config\.(?:ts|js|mjs|cjs)$").unwrap();

    static ref DEFAULT_IDENT_RE: Regex =
        Regex::new(r"export\s+default\s+([A-Za-z_$][\w$]*)").unwrap();

    static ref ICON_IMPORT_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s*\{([^}]*)\}\s*from\s*['"]lucide-react['"]"#).unwrap();

    static ref ICON_FACTORY_RE: Regex = Regex::new(
        r#"(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*create(?:Lucide)?Icon\(\s*['"]([A-Za-z0-9_-]+)['"]\s*,"#
    )
    .unwrap();
}

/// One icon component the document pre-registers as a shim.
#[derive(Debug, Clone, PartialEq)]
pub struct IconDefinition {
    /// Local component name (`Zap`, or the `as` alias).
    pub name: String,
    /// kebab-case label shown on the rendered glyph.
    pub label: String,
    /// Verbatim vector-node array literal, when the source carried one.
    pub nodes: Option<String>,
}

/// Extract the theme configuration literal from the project, falling back to
/// [`DEFAULT_THEME_CONFIG`].
pub fn extract_theme_config(files: &BTreeMap<String, ProjectFile>) -> String {
    for (path, file) in files {
        if !CONFIG_FILE_RE.is_match(path) {
            continue;
        }
        if let Some(literal) = theme_config_from_source(&file.content) {
            return literal;
        }
    }
    DEFAULT_THEME_CONFIG.to_string()
}

fn theme_config_from_source(content: &str) -> Option<String> {
    // `export default config;` — follow the identifier to its declaration.
    if let Some(cap) = DEFAULT_IDENT_RE.captures(content) {
        let ident = &cap[1];
        let decl_re =
            Regex::new(&format!(r"(?:const|let|var)\s+{}\s*=", regex::escape(ident))).ok()?;
        if let Some(decl) = decl_re.find(content) {
            return extract_balanced(content, decl.end(), '{', '}');
        }
        return None;
    }

    let anchor = content
        .find("export default")
        .map(|i| i + "export default".len())
        .or_else(|| {
            content
                .find("module.exports")
                .map(|i| i + "module.exports".len())
        })?;
    extract_balanced(content, anchor, '{', '}')
}

/// kebab-case label from a PascalCase component name.
pub fn pascal_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Collect every icon the project references: named imports from the icon
/// library and inline factory calls (whose vector array is extracted
/// verbatim). Deterministic order, first definition of a name wins.
pub fn collect_icon_definitions(files: &BTreeMap<String, ProjectFile>) -> Vec<IconDefinition> {
    let mut icons: Vec<IconDefinition> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for file in files.values() {
        for cap in ICON_IMPORT_RE.captures_iter(&file.content) {
            for spec in cap[1].split(',') {
                let spec = spec.trim();
                if spec.is_empty() {
                    continue;
                }
                let (imported, local) = match spec.split_once(" as ") {
                    Some((i, l)) => (i.trim(), l.trim()),
                    None => (spec, spec),
                };
                if local.is_empty() || !seen.insert(local.to_string()) {
                    continue;
                }
                icons.push(IconDefinition {
                    name: local.to_string(),
                    label: pascal_to_kebab(imported),
                    nodes: None,
                });
            }
        }

        for cap in ICON_FACTORY_RE.captures_iter(&file.content) {
            let name = cap[1].to_string();
            let label = cap[2].to_string();
            let call_end = cap.get(0).unwrap().end();
            let nodes = extract_balanced(&file.content, call_end, '[', ']');
            if seen.insert(name.clone()) {
                icons.push(IconDefinition { name, label, nodes });
            } else if let Some(existing) = icons.iter_mut().find(|i| i.name == name) {
                // A factory definition is richer than a bare import.
                if existing.nodes.is_none() {
                    existing.label = label;
                    existing.nodes = nodes;
                }
            }
        }
    }
    icons
}

/// Shim registrations for the collected icons, emitted ahead of boot so the
/// first execution attempt already sees them.
pub fn icon_preamble_js(icons: &[IconDefinition]) -> String {
    let mut out = String::new();
    for icon in icons {
        let nodes = icon.nodes.as_deref().unwrap_or("null");
        out.push_str(&format!(
            "__lumenShims[\"{}\"] = __lumenIcon(\"{}\", {});\n",
            icon.name, icon.label, nodes
        ));
    }
    out
}
