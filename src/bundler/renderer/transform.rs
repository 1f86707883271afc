//! Content transform pipeline.
//!
//! Starting from one script, follows relative `require()` calls and
//! side-effect `import` statements, runs every reached file through the
//! handler chains of the rule set, and emits a single self-contained bundle
//! with a small module-map loader. Bare specifiers are left to the host
//! runtime's own `require`.

use super::rules::{Handler, RuleSet};
use crate::bundler::error::{Error, Result};
use path_absolutize::Absolutize;
use regex::{Captures, Regex};
use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::LazyLock,
};

static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid require pattern")
});

static SIDE_EFFECT_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([ \t]*)import\s+['"]([^'"\n]+)['"]\s*;?"#)
        .expect("valid import pattern")
});

static CSS_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment pattern"));

/// What a module's code currently is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SourceKind {
    Script,
    Text,
}

impl SourceKind {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "cjs" | "mjs") => SourceKind::Script,
            _ => SourceKind::Text,
        }
    }
}

/// A file moving through a handler chain.
#[derive(Clone, Debug)]
struct ModuleSource {
    kind: SourceKind,
    code: String,
}

/// Quotes a string as a JavaScript literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn apply_handler(handler: Handler, source: ModuleSource) -> std::result::Result<ModuleSource, String> {
    let expect = |kind: SourceKind| {
        if source.kind == kind {
            Ok(())
        } else {
            Err(format!(
                "handler '{handler}' expects {} input",
                match kind {
                    SourceKind::Script => "script",
                    SourceKind::Text => "raw text",
                }
            ))
        }
    };

    match handler {
        Handler::Css => {
            expect(SourceKind::Text)?;
            let css = CSS_COMMENT_RE.replace_all(&source.code, "");
            Ok(ModuleSource {
                kind: SourceKind::Script,
                code: format!("module.exports = {};\n", js_string(css.trim())),
            })
        }
        Handler::Style => {
            expect(SourceKind::Script)?;
            Ok(ModuleSource {
                kind: SourceKind::Script,
                code: format!(
                    "{}\n;(function (css) {{\n  if (typeof document === \"undefined\" || typeof css !== \"string\") return;\n  var style = document.createElement(\"style\");\n  style.textContent = css;\n  document.head.appendChild(style);\n}})(module.exports);\n",
                    source.code.trim_end()
                ),
            })
        }
        Handler::Json => {
            expect(SourceKind::Text)?;
            let value: serde_json::Value =
                serde_json::from_str(&source.code).map_err(|e| format!("invalid JSON: {e}"))?;
            Ok(ModuleSource {
                kind: SourceKind::Script,
                code: format!("module.exports = {value};\n"),
            })
        }
        Handler::Text => {
            expect(SourceKind::Text)?;
            Ok(ModuleSource {
                kind: SourceKind::Script,
                code: format!("module.exports = {};\n", js_string(&source.code)),
            })
        }
    }
}

/// A finished bundle.
#[derive(Clone, Debug)]
pub struct Bundle {
    /// Module ids in discovery order; the first is the entry.
    pub modules: Vec<String>,
    /// Bundle source.
    pub code: String,
}

/// Bundles scripts for one entry point.
pub struct Transformer<'a> {
    rules: &'a RuleSet,
    project_root: &'a Path,
    entry_point: &'a str,
}

impl<'a> Transformer<'a> {
    /// Creates a transformer; `entry_point` only labels errors.
    pub fn new(rules: &'a RuleSet, project_root: &'a Path, entry_point: &'a str) -> Self {
        Self {
            rules,
            project_root,
            entry_point,
        }
    }

    fn error(&self, file: &Path, reason: impl Into<String>) -> Error {
        Error::Transform {
            entry_point: self.entry_point.to_string(),
            file: file.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Module id: project-relative path with forward slashes.
    fn module_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(self.project_root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn resolve(&self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        let base = importer.parent()?;
        let candidate = Path::new(specifier).absolutize_from(base).ok()?.into_owned();
        let with_suffix = |suffix: &str| {
            let mut s = candidate.clone().into_os_string();
            s.push(suffix);
            PathBuf::from(s)
        };
        [
            candidate.clone(),
            with_suffix(".js"),
            with_suffix(".json"),
            candidate.join("index.js"),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Runs a file through its handler chain.
    fn load(&self, path: &Path) -> Result<String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| self.error(path, format!("cannot read source: {e}")))?;
        let relative = path.strip_prefix(self.project_root).unwrap_or(path);

        let mut source = ModuleSource {
            kind: SourceKind::of(path),
            code: raw,
        };
        for handler in self.rules.handlers_for(relative) {
            source = apply_handler(handler, source).map_err(|reason| self.error(path, reason))?;
        }

        match source.kind {
            SourceKind::Script => Ok(source.code),
            SourceKind::Text => Err(self.error(
                path,
                format!("no rule handles {}", relative.display()),
            )),
        }
    }

    /// Rewrites relative specifiers to module ids, queueing new modules.
    fn link(
        &self,
        path: &Path,
        code: &str,
        ids: &mut HashMap<PathBuf, String>,
        queue: &mut VecDeque<PathBuf>,
    ) -> Result<String> {
        // Discovery follows source order across both statement forms
        let mut found: Vec<(usize, String)> = REQUIRE_RE
            .captures_iter(code)
            .map(|c| (c.get(0).map_or(0, |m| m.start()), c[1].to_string()))
            .chain(
                SIDE_EFFECT_IMPORT_RE
                    .captures_iter(code)
                    .map(|c| (c.get(0).map_or(0, |m| m.start()), c[2].to_string())),
            )
            .filter(|(_, s)| s.starts_with("./") || s.starts_with("../"))
            .collect();
        found.sort_by_key(|(at, _)| *at);
        let specifiers: Vec<String> = found.into_iter().map(|(_, s)| s).collect();

        let mut resolved: HashMap<String, String> = HashMap::new();
        for specifier in specifiers {
            if resolved.contains_key(&specifier) {
                continue;
            }
            let target = self
                .resolve(path, &specifier)
                .ok_or_else(|| self.error(path, format!("cannot resolve '{specifier}'")))?;
            let id = match ids.get(&target) {
                Some(id) => id.clone(),
                None => {
                    let id = self.module_id(&target);
                    ids.insert(target.clone(), id.clone());
                    queue.push_back(target);
                    id
                }
            };
            resolved.insert(specifier, id);
        }

        let target_of = |specifier: &str| {
            resolved
                .get(specifier)
                .map(String::as_str)
                .unwrap_or(specifier)
                .to_string()
        };
        let code = REQUIRE_RE.replace_all(code, |c: &Captures| {
            format!("require({})", js_string(&target_of(&c[1])))
        });
        let code = SIDE_EFFECT_IMPORT_RE.replace_all(&code, |c: &Captures| {
            format!("{}require({});", &c[1], js_string(&target_of(&c[2])))
        });
        Ok(code.into_owned())
    }

    /// Bundles `entry` and everything it reaches.
    ///
    /// `prelude` is emitted verbatim ahead of the loader.
    pub fn bundle(&self, entry: &Path, prelude: &str) -> Result<Bundle> {
        if !entry.is_file() {
            return Err(self.error(entry, "entry script not found"));
        }

        let entry_id = self.module_id(entry);
        let mut ids = HashMap::from([(entry.to_path_buf(), entry_id.clone())]);
        let mut queue = VecDeque::from([entry.to_path_buf()]);
        let mut modules: Vec<(String, String)> = Vec::new();

        while let Some(path) = queue.pop_front() {
            let code = self.load(&path)?;
            let code = self.link(&path, &code, &mut ids, &mut queue)?;
            let id = ids.get(&path).cloned().unwrap_or_else(|| self.module_id(&path));
            log::trace!("[{}] bundled module {}", self.entry_point, id);
            modules.push((id, code));
        }

        Ok(Bundle {
            modules: modules.iter().map(|(id, _)| id.clone()).collect(),
            code: emit(&modules, &entry_id, prelude),
        })
    }
}

fn emit(modules: &[(String, String)], entry_id: &str, prelude: &str) -> String {
    let mut out = String::new();
    if !prelude.is_empty() {
        out.push_str(prelude);
        out.push('\n');
    }
    out.push_str(
        "(function (modules, entry) {\n  var cache = {};\n  var hostRequire = typeof require === \"function\" ? require : null;\n  function load(id) {\n    if (Object.prototype.hasOwnProperty.call(cache, id)) return cache[id].exports;\n    if (!Object.prototype.hasOwnProperty.call(modules, id)) {\n      if (hostRequire) return hostRequire(id);\n      throw new Error(\"Cannot find module '\" + id + \"'\");\n    }\n    var module = { exports: {} };\n    cache[id] = module;\n    modules[id].call(module.exports, module, module.exports, load);\n    return module.exports;\n  }\n  return load(entry);\n})({\n",
    );
    for (id, code) in modules {
        out.push_str(&format!(
            "{}: function (module, exports, require) {{\n{}\n}},\n",
            js_string(id),
            code.trim_end()
        ));
    }
    out.push_str(&format!("}}, {});\n", js_string(entry_id)));
    out
}

/// Inserts a script tag for `script` before `</body>`, or appends it.
pub fn inject_script(html: &str, script: &str) -> String {
    let tag = format!("<script defer src=\"{script}\"></script>");
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => format!("{}  {}\n{}", &html[..at], tag, &html[at..]),
        None => format!("{html}\n{tag}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::renderer::rules::{BundleRule, RuleSetBuilder};

    fn css_rules() -> RuleSet {
        let mut builder = RuleSetBuilder::new();
        builder.push(BundleRule::new("*.css", vec![Handler::Css, Handler::Style]).unwrap());
        builder.push(BundleRule::new("*.json", vec![Handler::Json]).unwrap());
        builder.snapshot()
    }

    fn write(root: &Path, rel: &str, body: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn follows_relative_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let entry = write(
            root,
            "src/renderer.js",
            "import './index.css';\nconst util = require('./lib/util');\nconst { ipcRenderer } = require('electron');\nutil.go();\n",
        );
        write(root, "src/index.css", "/* theme */ body { margin: 0; }");
        write(root, "src/lib/util/index.js", "const cfg = require('../../../config.json');\nmodule.exports = { go() { return cfg.mode; } };");
        write(root, "config.json", "{\"mode\": \"webgpu\"}");

        let rules = css_rules();
        let bundle = Transformer::new(&rules, root, "main_window")
            .bundle(&entry, "")
            .unwrap();

        assert_eq!(
            bundle.modules,
            vec![
                "src/renderer.js",
                "src/index.css",
                "src/lib/util/index.js",
                "config.json"
            ]
        );
        assert!(bundle.code.contains("require(\"src/index.css\");"));
        assert!(bundle.code.contains("require(\"src/lib/util/index.js\")"));
        assert!(bundle.code.contains("require(\"electron\")"));
        assert!(bundle.code.contains("body { margin: 0; }"));
        assert!(!bundle.code.contains("theme"));
        assert!(bundle.code.contains("document.createElement(\"style\")"));
        assert!(bundle.code.contains("module.exports = {\"mode\":\"webgpu\"};"));
        assert!(bundle.code.ends_with("}, \"src/renderer.js\");\n"));
    }

    #[test]
    fn shared_dependency_is_bundled_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let entry = write(root, "a.js", "require('./b'); require('./c');");
        write(root, "b.js", "require('./c');");
        write(root, "c.js", "module.exports = 1;");

        let rules = RuleSet::default();
        let bundle = Transformer::new(&rules, root, "w").bundle(&entry, "").unwrap();
        assert_eq!(bundle.modules, vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn unresolvable_specifier_names_the_importer() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "src/renderer.js", "require('./missing');");

        let rules = RuleSet::default();
        let err = Transformer::new(&rules, dir.path(), "main_window")
            .bundle(&entry, "")
            .unwrap_err();
        match err {
            Error::Transform { entry_point, file, reason } => {
                assert_eq!(entry_point, "main_window");
                assert_eq!(file, entry);
                assert!(reason.contains("./missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unhandled_file_type_is_a_transform_error() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.js", "import './theme.css';");
        write(dir.path(), "theme.css", "p {}");

        let rules = RuleSet::default();
        let err = Transformer::new(&rules, dir.path(), "w").bundle(&entry, "").unwrap_err();
        assert!(err.to_string().contains("no rule handles"));
    }

    #[test]
    fn handler_input_kind_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.js", "require('./theme.css');");
        write(dir.path(), "theme.css", "p {}");

        let mut builder = RuleSetBuilder::new();
        builder.push(BundleRule::new("*.css", vec![Handler::Style, Handler::Css]).unwrap());
        let rules = builder.snapshot();

        let err = Transformer::new(&rules, dir.path(), "w").bundle(&entry, "").unwrap_err();
        assert!(err.to_string().contains("handler 'style' expects script input"));
    }

    #[test]
    fn invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.js", "require('./bad.json');");
        write(dir.path(), "bad.json", "{ nope");

        let rules = css_rules();
        let err = Transformer::new(&rules, dir.path(), "w").bundle(&entry, "").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn prelude_precedes_loader() {
        let dir = tempfile::tempdir().unwrap();
        let entry = write(dir.path(), "main.js", "module.exports = 0;");
        let rules = RuleSet::default();
        let bundle = Transformer::new(&rules, dir.path(), "main")
            .bundle(&entry, "const X = 1;")
            .unwrap();
        assert!(bundle.code.starts_with("const X = 1;\n(function (modules, entry)"));
    }

    #[test]
    fn script_tag_lands_before_body_close() {
        let html = "<html><BODY><canvas></canvas></BODY></html>";
        let out = inject_script(html, "renderer.js");
        assert_eq!(
            out,
            "<html><BODY><canvas></canvas>  <script defer src=\"renderer.js\"></script>\n</BODY></html>"
        );
        assert!(inject_script("<p>", "a.js").ends_with("<script defer src=\"a.js\"></script>\n"));
    }
}
