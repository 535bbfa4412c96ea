//! Input discovery: turn the command-line paths into a list of `.py` files.
//!
//! Explicit file arguments are taken as given.  Directories are walked with
//! `ignore`, which respects `.gitignore`/`.ignore` and skips hidden entries;
//! on top of that the virtual-environment and cache directories in
//! [`ALWAYS_EXCLUDE`] are never entered, and any path component below the
//! walked root matching a caller-supplied `exclude` pattern drops the file.

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Directory names never walked into, whether or not they are hidden or
/// gitignored.
const ALWAYS_EXCLUDE: &[&str] = &[
    "venv",
    "env",
    ".venv",
    ".env",
    "virtualenv",
    "__pycache__",
    ".mypy_cache",
    ".ruff_cache",
    ".pytest_cache",
    ".hypothesis",
    "build",
    "dist",
    ".eggs",
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    ".tox",
    ".nox",
];

/// Where one run's sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    /// `-` on the command line.
    Stdin,
}

/// Expand command-line `paths` into inputs: files as given, directories
/// walked for `.py` files (sorted), `-` as standard input.
///
/// A path that does not exist is an error.
pub fn collect_inputs(paths: &[PathBuf], exclude: &[String]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.as_os_str() == "-" {
            inputs.push(Input::Stdin);
        } else if path.is_dir() {
            let found = discover_python_files(path, exclude)?;
            tracing::debug!(dir = %path.display(), files = found.len(), "walked directory");
            inputs.extend(found.into_iter().map(Input::File));
        } else if path.exists() {
            inputs.push(Input::File(path.clone()));
        } else {
            bail!("{}: no such file or directory", path.display());
        }
    }
    Ok(inputs)
}

/// All `.py` files under `root` that survive the exclusion rules, sorted.
pub fn discover_python_files(root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        // Apply .gitignore rules even outside a git checkout.
        .require_git(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file())
            || path.extension().and_then(|e| e.to_str()) != Some("py")
            || is_excluded(path.strip_prefix(root).unwrap_or(path), exclude)
        {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Whether any component of `path` (relative to the walked root) is always
/// excluded or contains one of the caller's `exclude` patterns.
fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    path.components().any(|component| {
        let Component::Normal(name) = component else {
            return false;
        };
        let name = name.to_string_lossy();
        ALWAYS_EXCLUDE.contains(&name.as_ref())
            || exclude.iter().any(|pat| name.contains(pat.as_str()))
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const IDIOM: &str = "acc = []\nfor i in xs:\n    acc.append(i)\n";

    fn discover(root: &Path) -> Vec<PathBuf> {
        discover_python_files(root, &[]).unwrap()
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_finds_python_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.py"), IDIOM).unwrap();
        fs::write(dir.path().join("a.py"), IDIOM).unwrap();
        fs::write(dir.path().join("notes.txt"), "acc = []").unwrap();

        assert_eq!(names(&discover(dir.path())), vec!["a.py", "b.py"]);
    }

    #[test]
    fn test_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        fs::create_dir(dir.path().join("generated")).unwrap();
        fs::write(dir.path().join("generated/out.py"), IDIOM).unwrap();
        fs::write(dir.path().join("main.py"), IDIOM).unwrap();

        assert_eq!(names(&discover(dir.path())), vec!["main.py"]);
    }

    #[test]
    fn test_skips_hidden_and_venv_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache/x.py"), IDIOM).unwrap();
        fs::create_dir_all(dir.path().join("venv/lib")).unwrap();
        fs::write(dir.path().join("venv/lib/site.py"), IDIOM).unwrap();
        fs::create_dir(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("__pycache__/c.py"), IDIOM).unwrap();
        fs::write(dir.path().join("app.py"), IDIOM).unwrap();

        assert_eq!(names(&discover(dir.path())), vec!["app.py"]);
    }

    #[test]
    fn test_caller_exclude_patterns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();
        fs::write(dir.path().join("tests/test_acc.py"), IDIOM).unwrap();
        fs::write(dir.path().join("app.py"), IDIOM).unwrap();
        fs::write(dir.path().join("utils.py"), IDIOM).unwrap();

        let files = discover_python_files(dir.path(), &["tests".to_string()]).unwrap();
        assert_eq!(names(&files), vec!["app.py", "utils.py"]);
    }

    #[test]
    fn test_root_inside_excluded_name_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build/proj");
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("app.py"), IDIOM).unwrap();
        fs::write(root.join("dist/gen.py"), IDIOM).unwrap();

        assert_eq!(names(&discover(&root)), vec!["app.py"]);
    }

    #[test]
    fn test_caller_exclude_ignores_root_components() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tests_root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("app.py"), IDIOM).unwrap();

        let files = discover_python_files(&root, &["tests".to_string()]).unwrap();
        assert_eq!(names(&files), vec!["app.py"]);
    }

    #[test]
    fn test_collect_inputs_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_inputs(&[dir.path().join("gone.py")], &[]).unwrap_err();
        assert!(err.to_string().contains("gone.py"));
    }

    #[test]
    fn test_collect_inputs_mixes_files_dirs_and_stdin() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("pkg");
        fs::create_dir(&pkg).unwrap();
        fs::write(pkg.join("m.py"), IDIOM).unwrap();
        let single = dir.path().join("script.txt");
        fs::write(&single, IDIOM).unwrap();

        let inputs =
            collect_inputs(&[single.clone(), pkg.clone(), PathBuf::from("-")], &[]).unwrap();
        assert_eq!(
            inputs,
            vec![
                Input::File(single),
                Input::File(pkg.join("m.py")),
                Input::Stdin,
            ]
        );
    }
}
