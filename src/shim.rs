//! Self-healing runtime generation.
//!
//! The compiled bundle executes inside the produced document, in a scope the
//! runtime builds from a shim registry. When execution throws because a
//! capitalized identifier is undefined — the naming convention for view
//! components — the runtime registers a fallback for that one symbol and
//! synchronously re-attempts execution, up to a fixed retry ceiling. Each
//! retry registers exactly one new shim, so the ceiling bounds the number of
//! distinct unresolved symbols, never loops. Any other error, or exhausting
//! the ceiling, removes the loading indicator and shows a plain-text error
//! panel; nothing is swallowed.
//!
//! The registry is created per document execution — one document, one
//! registry, no sharing.

/// Default bound on shim-registration retries.
pub const DEFAULT_SHIM_RETRY_LIMIT: usize = 10;

const RETRY_TOKEN: &str = "__LUMEN_RETRY_CEILING__";

/// Definitions for the in-document runtime: registry, fallback factories,
/// execution scope, bounded retry loop, loader choreography, payload decode
/// and the transpile-then-execute start routine. Boot wiring is emitted
/// separately by [`SHIM_BOOT_JS`] so icon registrations can precede it.
pub fn shim_runtime_js(retry_limit: usize) -> String {
    SHIM_RUNTIME_TEMPLATE.replace(RETRY_TOKEN, &retry_limit.to_string())
}

const SHIM_RUNTIME_TEMPLATE: &str = r#"var __lumenShims = Object.create(null);
var __lumenAttempts = 0;
var __LUMEN_MAX_RETRIES = __LUMEN_RETRY_CEILING__;

function __lumenNoop() {}

function __lumenLabel(name) {
  return name.replace(/([a-z0-9])([A-Z])/g, "$1-$2").toLowerCase();
}

function __lumenPlaceholder(name) {
  return function (props) {
    return React.createElement(
      "div",
      { className: "lumen-shim", "data-shim": name },
      (props && props.children) || null
    );
  };
}

function __lumenIcon(label, nodes) {
  return function (props) {
    var children;
    if (nodes && nodes.length) {
      children = nodes.map(function (node, i) {
        return React.createElement(node[0], Object.assign({ key: i }, node[1] || {}));
      });
    } else {
      children = React.createElement("circle", { cx: 12, cy: 12, r: 9 });
    }
    var attrs = Object.assign(
      {
        xmlns: "http://www.w3.org/2000/svg",
        width: 24,
        height: 24,
        viewBox: "0 0 24 24",
        fill: "none",
        stroke: "currentColor",
        strokeWidth: 2,
        strokeLinecap: "round",
        strokeLinejoin: "round",
        "aria-label": label
      },
      props || {}
    );
    return React.createElement("svg", attrs, children);
  };
}

function __lumenRegisterFallback(name) {
  if (/^[A-Z0-9_]+$/.test(name)) { return ""; }
  if (/Context$/.test(name)) { return React.createContext(null); }
  if (/(Handler|Callback)$/.test(name)) { return __lumenNoop; }
  if (/Icon$/.test(name)) { return __lumenIcon(__lumenLabel(name), null); }
  return __lumenPlaceholder(name);
}

function __lumenScope() {
  var scope = {
    window: window,
    document: document,
    setTimeout: window.setTimeout.bind(window),
    clearTimeout: window.clearTimeout.bind(window),
    setInterval: window.setInterval.bind(window),
    clearInterval: window.clearInterval.bind(window),
    requestAnimationFrame: window.requestAnimationFrame.bind(window),
    addEventListener: window.addEventListener.bind(window),
    removeEventListener: window.removeEventListener.bind(window),
    matchMedia: window.matchMedia.bind(window),
    React: window.React,
    ReactDOM: window.ReactDOM
  };
  for (var key in __lumenShims) {
    scope[key] = __lumenShims[key];
  }
  return scope;
}

function __lumenHideLoader(immediate) {
  var loader = document.getElementById("__lumen-loading");
  if (!loader) { return; }
  if (immediate) {
    if (loader.parentNode) { loader.parentNode.removeChild(loader); }
    return;
  }
  loader.classList.add("lumen-hidden");
  setTimeout(function () {
    if (loader.parentNode) { loader.parentNode.removeChild(loader); }
  }, 400);
}

function __lumenOnSuccess() {
  __lumenHideLoader(false);
  var mount = document.getElementById("root");
  if (mount) { mount.classList.add("lumen-visible"); }
}

function __lumenShowError(err) {
  __lumenHideLoader(true);
  var panel = document.createElement("pre");
  panel.className = "lumen-error";
  panel.textContent = String((err && err.message) || err);
  document.body.appendChild(panel);
}

function __lumenExecute(code) {
  var scope = __lumenScope();
  var names = Object.keys(scope);
  var values = names.map(function (k) { return scope[k]; });
  try {
    var run = new Function(names.join(","), code);
    run.apply(null, values);
    __lumenOnSuccess();
  } catch (err) {
    var message = String((err && err.message) || err);
    var match = /([A-Za-z_$][A-Za-z0-9_$]*) is not defined/.exec(message);
    if (
      match &&
      /^[A-Z]/.test(match[1]) &&
      !(match[1] in __lumenShims) &&
      __lumenAttempts < __LUMEN_MAX_RETRIES
    ) {
      __lumenAttempts += 1;
      __lumenShims[match[1]] = __lumenRegisterFallback(match[1]);
      __lumenExecute(code);
      return;
    }
    __lumenShowError(err);
  }
}

function __lumenDecode(encoded) {
  return decodeURIComponent(escape(window.atob(encoded)));
}

function __lumenStart() {
  try {
    var source = __lumenDecode(__LUMEN_SRC);
    var compiled = Babel.transform(source, {
      presets: ["react"],
      filename: "bundle.jsx"
    }).code;
    __lumenExecute(compiled);
  } catch (err) {
    __lumenShowError(err);
  }
}"#;

/// Boot wiring: start once the document is interactive. Appended after any
/// icon registrations so pre-seeded shims are visible to the first attempt.
pub const SHIM_BOOT_JS: &str = r#"if (document.readyState === "loading") {
  document.addEventListener("DOMContentLoaded", __lumenStart);
} else {
  __lumenStart();
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ceiling_is_ten() {
        let js = shim_runtime_js(DEFAULT_SHIM_RETRY_LIMIT);
        assert!(js.contains("var __LUMEN_MAX_RETRIES = 10;"));
        assert!(!js.contains(RETRY_TOKEN));
    }

    #[test]
    fn test_custom_ceiling() {
        let js = shim_runtime_js(3);
        assert!(js.contains("var __LUMEN_MAX_RETRIES = 3;"));
    }

    #[test]
    fn test_retry_matches_undefined_symbol_shape() {
        let js = shim_runtime_js(DEFAULT_SHIM_RETRY_LIMIT);
        assert!(js.contains("is not defined"));
        // capitalized-only convention
        assert!(js.contains("/^[A-Z]/.test(match[1])"));
        // synchronous re-attempt
        assert!(js.contains("__lumenExecute(code);"));
    }

    #[test]
    fn test_scope_exposes_required_builtins() {
        let js = shim_runtime_js(DEFAULT_SHIM_RETRY_LIMIT);
        for member in [
            "setTimeout",
            "setInterval",
            "addEventListener",
            "removeEventListener",
            "matchMedia",
            "requestAnimationFrame",
        ] {
            assert!(js.contains(member), "scope missing {member}");
        }
    }

    #[test]
    fn test_error_panel_is_plain_text() {
        let js = shim_runtime_js(DEFAULT_SHIM_RETRY_LIMIT);
        assert!(js.contains("panel.textContent"));
        assert!(js.contains("lumen-error"));
    }

    #[test]
    fn test_boot_waits_for_dom() {
        assert!(SHIM_BOOT_JS.contains("DOMContentLoaded"));
        assert!(SHIM_BOOT_JS.contains("__lumenStart"));
    }
}
