//! Source file enumeration and eligibility.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::IndexError;

/// File extensions that are indexed.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "go", "rs", "java", "c", "cpp", "h",
];

pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/venv/**",
    "**/__pycache__/**",
    "**/build/**",
    "**/dist/**",
    "**/target/**",
    "**/.git/**",
    "**/*.min.js",
    "**/.*/**",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Decides which workspace files are indexed.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    excludes: Vec<Pattern>,
    respect_gitignore: bool,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self {
            excludes: DEFAULT_EXCLUDES
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
            respect_gitignore: true,
        }
    }
}

impl SourceFilter {
    /// # Errors
    ///
    /// Returns `IndexError::Config` if an exclusion glob does not parse.
    pub fn new<S: AsRef<str>>(excludes: &[S], respect_gitignore: bool) -> Result<Self, IndexError> {
        let excludes = excludes
            .iter()
            .map(|raw| {
                Pattern::new(raw.as_ref()).map_err(|e| {
                    IndexError::Config(format!("invalid exclude glob {:?}: {e}", raw.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            excludes,
            respect_gitignore,
        })
    }

    /// Whether a workspace-relative, `/`-separated path should be indexed.
    #[must_use]
    pub fn is_eligible(&self, rel_path: &str) -> bool {
        has_source_extension(rel_path) && !self.is_excluded(rel_path)
    }

    #[must_use]
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.excludes
            .iter()
            .any(|p| p.matches_with(rel_path, MATCH_OPTIONS))
    }
}

fn has_source_extension(rel_path: &str) -> bool {
    Path::new(rel_path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// An eligible file: absolute path plus its workspace-relative form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub rel_path: String,
}

/// `path` relative to `root` with `/` separators, or `None` if it lies outside `root`.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Enumerate eligible files under `root`, sorted by relative path.
///
/// # Errors
///
/// Returns `IndexError::Walk` if `root` is not a directory.
pub fn collect_source_files(
    root: &Path,
    filter: &SourceFilter,
) -> Result<Vec<SourceFile>, IndexError> {
    if !root.is_dir() {
        return Err(IndexError::Walk(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files: Vec<SourceFile> = ignore::WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .parents(filter.respect_gitignore)
        .git_ignore(filter.respect_gitignore)
        .git_global(filter.respect_gitignore)
        .git_exclude(filter.respect_gitignore)
        .require_git(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|e| {
            let rel_path = relative_path(root, e.path())?;
            filter.is_eligible(&rel_path).then(|| SourceFile {
                path: e.into_path(),
                rel_path,
            })
        })
        .collect();

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x = 1\n").unwrap();
    }

    fn rel_paths(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel_path.as_str()).collect()
    }

    #[test]
    fn default_excludes_apply() {
        let filter = SourceFilter::default();
        assert!(filter.is_excluded("node_modules/react/index.js"));
        assert!(filter.is_excluded("web/node_modules/a.js"));
        assert!(filter.is_excluded("app/build/gen.ts"));
        assert!(filter.is_excluded("static/vendor.min.js"));
        assert!(filter.is_excluded(".github/scripts/check.py"));
        assert!(filter.is_excluded("src/.cache/x.rs"));
        assert!(!filter.is_excluded("src/build.rs"));
        assert!(!filter.is_excluded("src/main.rs"));
    }

    #[test]
    fn extension_allow_list() {
        let filter = SourceFilter::default();
        for ok in ["a.py", "b/c.tsx", "d.h", "e.cpp", "f.java", "g.go"] {
            assert!(filter.is_eligible(ok), "{ok}");
        }
        for skipped in ["README.md", "Cargo.toml", "a.hpp", "noext", "a.RS"] {
            assert!(!filter.is_eligible(skipped), "{skipped}");
        }
    }

    #[test]
    fn invalid_glob_is_config_error() {
        assert!(matches!(
            SourceFilter::new(&["[unclosed"], true),
            Err(IndexError::Config(_))
        ));
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/work/repo");
        assert_eq!(
            relative_path(root, &root.join("src").join("lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(relative_path(root, Path::new("/elsewhere/a.rs")), None);
        assert_eq!(relative_path(root, root), None);
    }

    #[test]
    fn collects_sorted_eligible_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/z.rs");
        touch(root, "src/a.rs");
        touch(root, "lib/util.py");
        touch(root, "README.md");
        touch(root, "node_modules/pkg/index.js");
        touch(root, ".hidden/secret.ts");
        touch(root, "dist/bundle.min.js");

        let files = collect_source_files(root, &SourceFilter::default()).unwrap();
        assert_eq!(rel_paths(&files), vec!["lib/util.py", "src/a.rs", "src/z.rs"]);
        assert!(files.iter().all(|f| f.path.starts_with(root)));
    }

    #[test]
    fn gitignore_is_respected_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        touch(root, "generated/out.rs");
        touch(root, "src/main.rs");

        let on = collect_source_files(root, &SourceFilter::default()).unwrap();
        assert_eq!(rel_paths(&on), vec!["src/main.rs"]);

        let off = SourceFilter::new(&[] as &[&str], false).unwrap();
        let files = collect_source_files(root, &off).unwrap();
        assert_eq!(rel_paths(&files), vec!["generated/out.rs", "src/main.rs"]);
    }

    #[test]
    fn custom_excludes_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "node_modules/a.js");
        touch(root, "tests/fixture.py");

        let filter = SourceFilter::new(&["tests/**"], true).unwrap();
        let files = collect_source_files(root, &filter).unwrap();
        assert_eq!(rel_paths(&files), vec!["node_modules/a.js"]);
    }

    #[test]
    fn missing_root_is_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            collect_source_files(&missing, &SourceFilter::default()),
            Err(IndexError::Walk(_))
        ));
    }
}
