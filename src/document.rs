//! Document building.
//!
//! Wraps one page's assembled bundle into a complete, self-contained HTML
//! document: escaped metadata, the CDN utility-CSS runtime plus the
//! extracted theme configuration, project CSS (source-only at-directives
//! stripped) with loader/fade transition rules, the UI runtime and the
//! in-browser transpiler, and the script payload.
//!
//! The bundle text is embedded base64-encoded and decoded at execution time
//! — never inlined as a literal — so the script content cannot interact with
//! the surrounding markup's escaping rules.

use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;

use crate::assemble::Bundle;
use crate::shim::{shim_runtime_js, SHIM_BOOT_JS};
use crate::OutputDocument;

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const REACT_CDN: &str = "https://unpkg.com/react@18/umd/react.production.min.js";
const REACT_DOM_CDN: &str = "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js";
const BABEL_CDN: &str = "https://unpkg.com/@babel/standalone/babel.min.js";

lazy_static! {
    /// `@tailwind base;` and friends — meaningless against the CDN runtime.
    static ref TAILWIND_DIRECTIVE_RE: Regex =
        Regex::new(r"(?m)^[ \t]*@tailwind\b[^;\n]*;?[ \t]*\r?$").unwrap();

    /// `@apply ...;` inside rules.
    static ref APPLY_DIRECTIVE_RE: Regex = Regex::new(r"@apply\b[^;}]*;?").unwrap();
}

/// Loading indicator, fade-in transition, shim placeholder and error panel
/// styling shared by every produced document.
const BASE_CSS: &str = r#"#__lumen-loading { position: fixed; inset: 0; display: flex; align-items: center; justify-content: center; background: #fff; transition: opacity 0.4s ease; z-index: 9999; }
#__lumen-loading.lumen-hidden { opacity: 0; pointer-events: none; }
.lumen-spinner { width: 2.5rem; height: 2.5rem; border: 3px solid #e5e7eb; border-top-color: #111827; border-radius: 9999px; animation: lumen-spin 0.8s linear infinite; }
@keyframes lumen-spin { to { transform: rotate(360deg); } }
#root { opacity: 0; transition: opacity 0.5s ease; }
#root.lumen-visible { opacity: 1; }
.lumen-shim { min-height: 2rem; border: 1px dashed #cbd5e1; border-radius: 0.375rem; }
.lumen-error { margin: 2rem; padding: 1rem; background: #fef2f2; color: #991b1b; white-space: pre-wrap; font-family: ui-monospace, monospace; }"#;

/// Everything the builder needs for one document.
#[derive(Debug, Clone)]
pub struct DocumentInput<'a> {
    pub bundle: &'a Bundle,
    pub title: &'a str,
    pub route_path: &'a str,
    pub styles: &'a str,
    pub theme_config: &'a str,
    pub icon_preamble: &'a str,
    pub retry_limit: usize,
}

/// Escape text for safe placement in markup content or attribute position.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Strip source-only at-directives from project CSS.
pub fn strip_at_directives(css: &str) -> String {
    let css = TAILWIND_DIRECTIVE_RE.replace_all(css, "");
    APPLY_DIRECTIVE_RE.replace_all(&css, "").trim().to_string()
}

/// Produce the complete HTML document for one page.
pub fn build_document(input: &DocumentInput<'_>) -> OutputDocument {
    let encoded = base64::engine::general_purpose::STANDARD.encode(input.bundle.code.as_bytes());
    let title = escape_html(input.title);
    let styles = strip_at_directives(input.styles);
    let runtime = shim_runtime_js(input.retry_limit);

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>{title}</title>
<script src="{TAILWIND_CDN}"></script>
<script>
tailwind.config = {theme_config};
</script>
<style>
{styles}
{BASE_CSS}
</style>
</head>
<body>
<div id="__lumen-loading"><div class="lumen-spinner"></div></div>
<div id="root"></div>
<script src="{REACT_CDN}" crossorigin></script>
<script src="{REACT_DOM_CDN}" crossorigin></script>
<script src="{BABEL_CDN}"></script>
<script>
(function () {{
var __LUMEN_SRC = "{encoded}";
{runtime}
{icon_preamble}{boot}
}})();
</script>
</body>
</html>
"#,
        title = title,
        theme_config = input.theme_config,
        styles = styles,
        encoded = encoded,
        runtime = runtime,
        icon_preamble = input.icon_preamble,
        boot = SHIM_BOOT_JS,
    );

    OutputDocument {
        route_path: input.route_path.to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::DEFAULT_SHIM_RETRY_LIMIT;

    fn bundle(code: &str) -> Bundle {
        Bundle {
            code: code.to_string(),
            root_component: "Page".to_string(),
        }
    }

    fn input<'a>(bundle: &'a Bundle, title: &'a str) -> DocumentInput<'a> {
        DocumentInput {
            bundle,
            title,
            route_path: "/",
            styles: "",
            theme_config: "{ theme: { extend: {} } }",
            icon_preamble: "",
            retry_limit: DEFAULT_SHIM_RETRY_LIMIT,
        }
    }

    #[test]
    fn test_title_is_escaped() {
        let b = bundle("function Page() {}");
        let doc = build_document(&input(&b, "<script>alert(1)</script> & Co"));
        assert!(doc
            .html
            .contains("<title>&lt;script&gt;alert(1)&lt;/script&gt; &amp; Co</title>"));
    }

    #[test]
    fn test_bundle_is_embedded_opaquely() {
        let code = "function Page() { return <div className=\"x\">ok</div>; }";
        let b = bundle(code);
        let doc = build_document(&input(&b, "Home"));
        // The raw script text never appears in the markup...
        assert!(!doc.html.contains(code));
        // ...but decodes back to it exactly.
        let encoded = base64::engine::general_purpose::STANDARD.encode(code.as_bytes());
        assert!(doc.html.contains(&encoded));
    }

    #[test]
    fn test_theme_config_injected() {
        let b = bundle("1");
        let mut inp = input(&b, "Home");
        inp.theme_config = "{ darkMode: \"class\" }";
        let doc = build_document(&inp);
        assert!(doc.html.contains("tailwind.config = { darkMode: \"class\" };"));
    }

    #[test]
    fn test_at_directives_stripped_from_styles() {
        let b = bundle("1");
        let mut inp = input(&b, "Home");
        inp.styles =
            "@tailwind base;\n@tailwind utilities;\n.btn { @apply px-4 py-2; color: red; }\n";
        let doc = build_document(&inp);
        assert!(!doc.html.contains("@tailwind"));
        assert!(!doc.html.contains("@apply"));
        assert!(doc.html.contains("color: red;"));
    }

    #[test]
    fn test_document_scaffold() {
        let b = bundle("1");
        let doc = build_document(&input(&b, "Home"));
        assert!(doc.html.starts_with("<!DOCTYPE html>"));
        assert!(doc.html.contains(TAILWIND_CDN));
        assert!(doc.html.contains(REACT_CDN));
        assert!(doc.html.contains(REACT_DOM_CDN));
        assert!(doc.html.contains(BABEL_CDN));
        assert!(doc.html.contains("id=\"__lumen-loading\""));
        assert!(doc.html.contains("id=\"root\""));
    }

    #[test]
    fn test_icon_preamble_precedes_boot() {
        let b = bundle("1");
        let mut inp = input(&b, "Home");
        inp.icon_preamble = "__lumenShims[\"Zap\"] = __lumenIcon(\"zap\", null);\n";
        let doc = build_document(&inp);
        let preamble_at = doc.html.find("__lumenShims[\"Zap\"]").unwrap();
        let boot_at = doc.html.find("DOMContentLoaded").unwrap();
        assert!(preamble_at < boot_at);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<i>"), "&lt;i&gt;");
        assert_eq!(escape_html("\"q\" 'v'"), "&quot;q&quot; &#39;v&#39;");
    }
}
