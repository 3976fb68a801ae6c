//! Bundle assembly.
//!
//! Orders and concatenates sanitized fragments — shared header, dependency
//! fragments in closure order, the page, shared footer — and synthesizes the
//! composition entry that instantiates the page's root view. The header and
//! footer views are only wrapped around the page when its own markup does not
//! already reference them, so chrome never renders twice.
//!
//! Top-level name collisions between fragments are resolved by a
//! deterministic aliasing pass: a later fragment re-declaring a name has that
//! binding and its in-fragment references renamed to `<name>__dupN`, while
//! the first declaration keeps the public name for every other call site.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Top-level declarations only — column-zero anchored on purpose, nested
    /// declarations are indented in generated sources.
    static ref TOP_LEVEL_DECL_RE: Regex =
        Regex::new(r"(?m)^(?:async\s+)?(?:function|class|const|let|var)\s+([A-Za-z_$][\w$]*)")
            .unwrap();

    static ref DEFAULT_FN_RE: Regex =
        Regex::new(r"export\s+default\s+function\s+([A-Za-z_$][\w$]*)").unwrap();
    static ref DEFAULT_CLASS_RE: Regex =
        Regex::new(r"export\s+default\s+class\s+([A-Za-z_$][\w$]*)").unwrap();
    static ref DEFAULT_IDENT_RE: Regex =
        Regex::new(r"(?m)^[ \t]*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?[ \t]*\r?$").unwrap();
}

/// Synthetic binding the sanitizer introduces for `export default <expr>`.
pub const SYNTHETIC_DEFAULT: &str = "__lumen_default";

/// Sanitized fragments for one page bundle, in role order.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    pub header: Option<String>,
    pub footer: Option<String>,
    pub dependencies: Vec<String>,
    pub page: String,
}

/// How the synthesized entry composes the page with chrome.
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    pub root_component: String,
    pub wrap_header: bool,
    pub wrap_footer: bool,
}

/// One page's executable script plus the root it mounts.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub code: String,
    pub root_component: String,
}

/// The page's root view binding, read from the *raw* page source before
/// export qualifiers are stripped. Falls back to the sanitizer's synthetic
/// default binding.
pub fn detect_root_component(raw_page: &str) -> String {
    for re in [&*DEFAULT_FN_RE, &*DEFAULT_CLASS_RE, &*DEFAULT_IDENT_RE] {
        if let Some(cap) = re.captures(raw_page) {
            return cap[1].to_string();
        }
    }
    SYNTHETIC_DEFAULT.to_string()
}

/// Whether the page's markup already references `<Tag` directly.
pub fn page_references_tag(raw_page: &str, tag: &str) -> bool {
    let re = Regex::new(&format!(r"<{}\b", regex::escape(tag))).unwrap();
    re.is_match(raw_page)
}

/// Concatenate fragments and synthesize the composition entry.
pub fn assemble(fragments: &FragmentSet, plan: &CompositionPlan) -> Bundle {
    let mut ordered: Vec<String> = Vec::new();
    if let Some(header) = &fragments.header {
        ordered.push(header.clone());
    }
    ordered.extend(fragments.dependencies.iter().cloned());
    ordered.push(fragments.page.clone());
    if let Some(footer) = &fragments.footer {
        ordered.push(footer.clone());
    }

    let page_index = if fragments.header.is_some() { 1 } else { 0 } + fragments.dependencies.len();
    let renamed = resolve_collisions(&mut ordered);

    // A collision can rename the page's own root binding.
    let mut root = plan.root_component.clone();
    if let Some(alias) = renamed
        .iter()
        .find(|(frag, name, _)| *frag == page_index && name == &root)
        .map(|(_, _, alias)| alias.clone())
    {
        root = alias;
    }

    let mut code = ordered.join("\n\n");
    code.push_str("\n\n");
    code.push_str(&composition_entry(&root, plan));

    Bundle {
        code,
        root_component: root,
    }
}

/// Rename later duplicate top-level declarations. Returns
/// `(fragment_index, original, alias)` for every rename applied.
fn resolve_collisions(fragments: &mut [String]) -> Vec<(usize, String, String)> {
    let mut seen: Vec<String> = Vec::new();
    let mut renames = Vec::new();
    let mut counter = 0usize;

    for (index, fragment) in fragments.iter_mut().enumerate() {
        let declared: Vec<String> = TOP_LEVEL_DECL_RE
            .captures_iter(fragment)
            .map(|cap| cap[1].to_string())
            .collect();

        for name in declared {
            if seen.iter().any(|s| s == &name) {
                counter += 1;
                let alias = format!("{name}__dup{counter}");
                let word = Regex::new(&format!(r"\b{}\b", regex::escape(&name))).unwrap();
                *fragment = word.replace_all(fragment, alias.as_str()).to_string();
                renames.push((index, name, alias));
            } else {
                seen.push(name);
            }
        }
    }
    renames
}

/// The synthesized entry: instantiates the root view, optionally wrapped in
/// chrome, and mounts it. Plain `createElement` calls — no markup syntax —
/// so the entry survives transpilation untouched.
fn composition_entry(root: &str, plan: &CompositionPlan) -> String {
    let mut children = Vec::new();
    if plan.wrap_header {
        children.push("React.createElement(Header, null)".to_string());
    }
    children.push(format!("React.createElement({root}, null)"));
    if plan.wrap_footer {
        children.push("React.createElement(Footer, null)".to_string());
    }

    format!(
        "const __LumenRoot = function () {{\n  return React.createElement(\n    React.Fragment,\n    null,\n    {}\n  );\n}};\nwindow.__LUMEN_MOUNT__ = function () {{\n  var container = document.getElementById(\"root\");\n  var root = ReactDOM.createRoot(container);\n  root.render(React.createElement(__LumenRoot, null));\n}};\nwindow.__LUMEN_MOUNT__();",
        children.join(",\n    ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(root: &str, header: bool, footer: bool) -> CompositionPlan {
        CompositionPlan {
            root_component: root.to_string(),
            wrap_header: header,
            wrap_footer: footer,
        }
    }

    #[test]
    fn test_detect_root_from_default_function() {
        assert_eq!(
            detect_root_component("export default function HomePage() {}"),
            "HomePage"
        );
    }

    #[test]
    fn test_detect_root_from_trailing_identifier() {
        assert_eq!(
            detect_root_component("const About = () => null;\nexport default About;\n"),
            "About"
        );
    }

    #[test]
    fn test_detect_root_fallback() {
        assert_eq!(detect_root_component("const x = 1;"), SYNTHETIC_DEFAULT);
    }

    #[test]
    fn test_page_tag_scan() {
        let raw = "export default function Page() { return <div><Navbar /></div>; }";
        assert!(page_references_tag(raw, "Navbar"));
        assert!(!page_references_tag(raw, "Nav"));
        assert!(!page_references_tag(raw, "Footer"));
    }

    #[test]
    fn test_fragment_order() {
        let fragments = FragmentSet {
            header: Some("function Header() {}".into()),
            footer: Some("function Footer() {}".into()),
            dependencies: vec!["function Card() {}".into()],
            page: "function Page() {}".into(),
        };
        let bundle = assemble(&fragments, &plan("Page", true, true));
        let header_at = bundle.code.find("function Header").unwrap();
        let card_at = bundle.code.find("function Card").unwrap();
        let page_at = bundle.code.find("function Page").unwrap();
        let footer_at = bundle.code.find("function Footer").unwrap();
        assert!(header_at < card_at && card_at < page_at && page_at < footer_at);
    }

    #[test]
    fn test_no_duplicate_header_when_page_composes_chrome() {
        let fragments = FragmentSet {
            header: Some("function Header() {}".into()),
            footer: Some("function Footer() {}".into()),
            dependencies: vec![],
            page: "function Page() { return React.createElement(Header, null); }".into(),
        };
        // Caller saw `<Header` in the raw page and disabled wrapping.
        let bundle = assemble(&fragments, &plan("Page", false, true));
        assert_eq!(bundle.code.matches("createElement(Header").count(), 1);
        assert!(bundle.code.contains("React.createElement(Footer, null)"));
    }

    #[test]
    fn test_collision_renames_later_fragment() {
        let fragments = FragmentSet {
            header: None,
            footer: None,
            dependencies: vec![
                "const Badge = () => 1;".into(),
                "const Badge = () => 2;\nconst usesIt = Badge;".into(),
            ],
            page: "function Page() { return Badge; }".into(),
        };
        let bundle = assemble(&fragments, &plan("Page", false, false));
        // First declaration keeps the public name.
        assert!(bundle.code.contains("const Badge = () => 1;"));
        assert!(bundle.code.contains("const Badge__dup1 = () => 2;"));
        // In-fragment references follow the alias.
        assert!(bundle.code.contains("const usesIt = Badge__dup1;"));
        // The page still resolves the surviving name.
        assert!(bundle.code.contains("function Page() { return Badge; }"));
    }

    #[test]
    fn test_collision_on_page_root_updates_composition() {
        let fragments = FragmentSet {
            header: None,
            footer: None,
            dependencies: vec!["const Page = () => null;".into()],
            page: "function Page() { return null; }".into(),
        };
        let bundle = assemble(&fragments, &plan("Page", false, false));
        assert_eq!(bundle.root_component, "Page__dup1");
        assert!(bundle
            .code
            .contains("React.createElement(Page__dup1, null)"));
    }

    #[test]
    fn test_mount_entry_present_once() {
        let fragments = FragmentSet {
            page: "function Page() {}".into(),
            ..Default::default()
        };
        let bundle = assemble(&fragments, &plan("Page", false, false));
        assert_eq!(bundle.code.matches("__LUMEN_MOUNT__()").count(), 1);
        assert!(bundle.code.contains("ReactDOM.createRoot"));
    }
}
