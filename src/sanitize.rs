//! Source sanitization.
//!
//! Converts one module's source text into a fragment that can execute as a
//! plain top-level statement sequence once every fragment shares a single
//! scope: module-system statements (import/export) and type-only syntax are
//! removed, runtime behavior is preserved.
//!
//! The rewrites are conservative, ordered regexes — whole-statement removals
//! run before inline annotation stripping, and the only brace-aware scanning
//! happens for multi-line `interface`/`type` declarations. A pathological
//! construct (a semicolon inside a string inside a single-line type alias)
//! degrades to best-effort output rather than a hard failure; the sanitizer
//! never validates syntax.
//!
//! `sanitize` is idempotent: fragments are re-sanitized when shared across
//! pages, and the second pass must be a no-op.

use lazy_static::lazy_static;
use regex::Regex;

use crate::extract::extract_balanced;

lazy_static! {
    /// Leading client/runtime-mode directive line.
    static ref DIRECTIVE_RE: Regex =
        Regex::new(r#"^\s*['"]use (?:client|server)['"];?[ \t]*\r?\n?"#).unwrap();

    /// `import ... from '...'` — named, default, namespace, type; the body may
    /// span lines (`[^;]` crosses newlines, non-greedy up to the source).
    static ref IMPORT_FROM_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s(?:[^;]*?)\bfrom\s*['"][^'"]+['"]\s*;?[ \t]*\r?$"#)
            .unwrap();

    /// Bare side-effect import: `import './globals.css';`
    static ref IMPORT_SIDE_EFFECT_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s*['"][^'"]+['"]\s*;?[ \t]*\r?$"#).unwrap();

    /// `export { A, B } from '...'` / `export { A as B };` / `export type { T }`
    /// — no local effect once modules share one scope.
    static ref EXPORT_BLOCK_RE: Regex = Regex::new(
        r#"(?m)^[ \t]*export\s+(?:type\s+)?\{[^}]*\}\s*(?:from\s*['"][^'"]+['"])?\s*;?[ \t]*\r?$"#
    )
    .unwrap();

    /// `export * from '...'` / `export * as ns from '...'`
    static ref EXPORT_STAR_RE: Regex = Regex::new(
        r#"(?m)^[ \t]*export\s*\*\s*(?:as\s+[\w$]+\s+)?from\s*['"][^'"]+['"]\s*;?[ \t]*\r?$"#
    )
    .unwrap();

    /// `export default function App` → `function App` (same for class).
    /// Anonymous default exports are left for the expression fallback.
    static ref EXPORT_DEFAULT_DECL_RE: Regex = Regex::new(
        r"(?m)^([ \t]*)export\s+default\s+(async\s+function|function|class)(\s+[A-Za-z_$])"
    )
    .unwrap();

    /// `export default App;` — the declaration already exists locally.
    static ref EXPORT_DEFAULT_IDENT_RE: Regex =
        Regex::new(r"(?m)^[ \t]*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?[ \t]*\r?$").unwrap();

    /// Any remaining `export default <expr>` — bound to a synthetic const so
    /// the fragment stays a statement sequence.
    static ref EXPORT_DEFAULT_EXPR_RE: Regex =
        Regex::new(r"(?m)^([ \t]*)export\s+default\s+").unwrap();

    /// `export const/let/var/function/class` — keep the declaration.
    static ref EXPORT_DECL_RE: Regex =
        Regex::new(r"(?m)^([ \t]*)export\s+(const|let|var|async\s+function|function|class)\b")
            .unwrap();

    /// Head of a (possibly multi-line) interface declaration.
    static ref INTERFACE_HEAD_RE: Regex =
        Regex::new(r"(?m)^[ \t]*(?:export\s+)?interface\s+[A-Za-z_$][\w$]*").unwrap();

    /// Head of a type alias declaration.
    static ref TYPE_ALIAS_HEAD_RE: Regex =
        Regex::new(r"(?m)^[ \t]*(?:export\s+)?type\s+[A-Za-z_$][\w$]*(?:<[^>\n]*>)?\s*=").unwrap();

    /// `({ title, items }: HeroProps)` → `({ title, items })`; also the
    /// inline object-type form `({ label }: { label: string })`.
    static ref DESTRUCTURE_ANNOTATION_RE: Regex =
        Regex::new(r"\}\s*:\s*(?:[A-Z][\w$]*(?:<[^>()]*>)?(?:\[\])?|\{[^{}]*\})\s*\)").unwrap();

    /// `): JSX.Element {` / `): string =>` — return-type annotations.
    static ref RETURN_TYPE_RE: Regex =
        Regex::new(r"\)\s*:\s*[A-Za-z_$][\w$.]*(?:<[^>{}()]*>)?(?:\[\])?\s*(\{|=>)").unwrap();

    /// Runs of 3+ blank lines.
    static ref BLANK_RUN_RE: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Sanitize one file's content into a globally-executable fragment.
pub fn sanitize(content: &str) -> String {
    let mut out = DIRECTIVE_RE.replace(content, "").to_string();

    // Whole-statement removals first.
    out = IMPORT_FROM_RE.replace_all(&out, "").to_string();
    out = IMPORT_SIDE_EFFECT_RE.replace_all(&out, "").to_string();
    out = EXPORT_BLOCK_RE.replace_all(&out, "").to_string();
    out = EXPORT_STAR_RE.replace_all(&out, "").to_string();

    // Export qualifiers, default forms before the generic fallback.
    out = EXPORT_DEFAULT_DECL_RE
        .replace_all(&out, "$1$2$3")
        .to_string();
    out = EXPORT_DEFAULT_IDENT_RE.replace_all(&out, "").to_string();
    out = EXPORT_DEFAULT_EXPR_RE
        .replace_all(&out, "${1}const __lumen_default = ")
        .to_string();
    out = EXPORT_DECL_RE.replace_all(&out, "$1$2").to_string();

    // Type-only declarations need brace-depth awareness.
    out = remove_block_declarations(&out, &INTERFACE_HEAD_RE);
    out = remove_type_aliases(&out);

    // Inline annotations last.
    out = DESTRUCTURE_ANNOTATION_RE.replace_all(&out, "})").to_string();
    out = RETURN_TYPE_RE.replace_all(&out, ")$1").to_string();

    out = BLANK_RUN_RE.replace_all(&out, "\n\n").to_string();
    out.trim().to_string()
}

/// Remove every declaration whose head matches `head_re` together with its
/// balanced `{ ... }` body (plus a trailing semicolon). Multi-line bodies are
/// handled by the balanced scan, not by line regexes.
fn remove_block_declarations(source: &str, head_re: &Regex) -> String {
    let mut out = source.to_string();
    loop {
        let Some((head_start, head_end)) = head_re.find(&out).map(|m| (m.start(), m.end())) else {
            return out;
        };
        let Some(body) = extract_balanced(&out, head_end, '{', '}') else {
            // Unterminated declaration; drop the head and bail rather than
            // loop forever.
            out.replace_range(head_start..head_end, "");
            return out;
        };
        let Some(body_start) = out[head_end..].find(&body) else {
            return out;
        };
        let mut end = head_end + body_start + body.len();
        if out[end..].as_bytes().first() == Some(&b';') {
            end += 1;
        }
        out.replace_range(head_start..end, "");
    }
}

/// Remove `type X = ...;` aliases. Object-shaped aliases get the balanced
/// scan; single-line aliases are cut at the first `;` or end of line (a
/// semicolon embedded in a string defeats this — accepted, best-effort).
fn remove_type_aliases(source: &str) -> String {
    let mut out = source.to_string();
    loop {
        let Some((head_start, head_end)) =
            TYPE_ALIAS_HEAD_RE.find(&out).map(|m| (m.start(), m.end()))
        else {
            return out;
        };
        let after = &out[head_end..];
        let trimmed_offset = after.len() - after.trim_start().len();
        let end = if after.trim_start().starts_with('{') {
            match extract_balanced(&out, head_end, '{', '}') {
                Some(body) => {
                    let body_at = out[head_end..].find(&body).unwrap_or(trimmed_offset);
                    let e = head_end + body_at + body.len();
                    // Union/intersection tails and the closing semicolon stay
                    // on the alias line.
                    out[e..].find('\n').map_or(out.len(), |n| e + n)
                }
                None => {
                    out.replace_range(head_start..head_end, "");
                    return out;
                }
            }
        } else {
            let rel = after.find(';').map(|s| s + 1);
            let rel_nl = after.find('\n');
            match (rel, rel_nl) {
                (Some(s), Some(n)) => head_end + s.min(n + 1),
                (Some(s), None) => head_end + s,
                (None, Some(n)) => head_end + n,
                (None, None) => out.len(),
            }
        };
        out.replace_range(head_start..end, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_client_directive() {
        let src = "\"use client\";\nconst x = 1;\n";
        assert_eq!(sanitize(src), "const x = 1;");
    }

    #[test]
    fn test_removes_single_line_imports() {
        let src = "import React from \"react\";\nimport { useState } from 'react';\nconst a = 1;";
        assert_eq!(sanitize(src), "const a = 1;");
    }

    #[test]
    fn test_removes_multi_line_import() {
        let src = "import {\n  Card,\n  CardHeader,\n} from \"@/components/ui/card\";\nlet n = 2;";
        assert_eq!(sanitize(src), "let n = 2;");
    }

    #[test]
    fn test_removes_side_effect_import() {
        let src = "import \"./globals.css\";\nconst k = 3;";
        assert_eq!(sanitize(src), "const k = 3;");
    }

    #[test]
    fn test_default_export_function_keeps_declaration() {
        let src = "export default function Home() {\n  return null;\n}";
        assert_eq!(sanitize(src), "function Home() {\n  return null;\n}");
    }

    #[test]
    fn test_default_export_identifier_removed() {
        let src = "function App() {}\nexport default App;\n";
        assert_eq!(sanitize(src), "function App() {}");
    }

    #[test]
    fn test_default_export_expression_becomes_const() {
        let src = "export default { title: \"Site\" };";
        assert_eq!(sanitize(src), "const __lumen_default = { title: \"Site\" };");
    }

    #[test]
    fn test_named_export_keeps_declaration() {
        let src = "export const Button = () => null;\nexport function helper() {}";
        assert_eq!(
            sanitize(src),
            "const Button = () => null;\nfunction helper() {}"
        );
    }

    #[test]
    fn test_reexport_blocks_deleted() {
        let src = "export { Button } from './button';\nexport { a as b };\nexport * from './x';\nconst z = 0;";
        assert_eq!(sanitize(src), "const z = 0;");
    }

    #[test]
    fn test_multi_line_interface_removed_fully() {
        let src = "interface HeroProps {\n  title: string;\n  items: {\n    id: number;\n  }[];\n}\nconst live = 1;";
        assert_eq!(sanitize(src), "const live = 1;");
    }

    #[test]
    fn test_exported_interface_removed() {
        let src = "export interface Props { a: string }\nlet v = 2;";
        assert_eq!(sanitize(src), "let v = 2;");
    }

    #[test]
    fn test_type_alias_removed() {
        let src = "type Variant = \"primary\" | \"ghost\";\ntype Shape = {\n  w: number;\n};\nconst keep = true;";
        assert_eq!(sanitize(src), "const keep = true;");
    }

    #[test]
    fn test_destructured_param_annotation_stripped() {
        let src = "function Hero({ title, subtitle }: HeroProps) {\n  return title;\n}";
        assert_eq!(
            sanitize(src),
            "function Hero({ title, subtitle }) {\n  return title;\n}"
        );
    }

    #[test]
    fn test_inline_object_type_annotation_stripped() {
        let src = "function Button({ label }: { label: string }) {\n  return label;\n}";
        assert_eq!(
            sanitize(src),
            "function Button({ label }) {\n  return label;\n}"
        );
    }

    #[test]
    fn test_return_type_annotation_stripped() {
        let src = "function total(): number {\n  return 1;\n}\nconst f = (): string => \"x\";";
        assert_eq!(
            sanitize(src),
            "function total() {\n  return 1;\n}\nconst f = () => \"x\";"
        );
    }

    #[test]
    fn test_blank_runs_collapse() {
        let src = "const a = 1;\n\n\n\n\nconst b = 2;";
        assert_eq!(sanitize(src), "const a = 1;\n\nconst b = 2;");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let src = "\"use client\";\nimport React from \"react\";\nimport { Card } from \"@/components/ui/card\";\n\ninterface Props {\n  name: string;\n}\n\nexport default function Page({ name }: Props): JSX.Element {\n  return <Card>{name}</Card>;\n}\n";
        let once = sanitize(src);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_runtime_shape_preserved() {
        let src = "export default function Page({ name }: PageProps) {\n  return <div>{name}</div>;\n}";
        let out = sanitize(src);
        assert!(out.contains("function Page({ name })"));
        assert!(out.contains("<div>{name}</div>"));
    }
}
