//! Mapping between profile paths and the filesystem.
//!
//! Cover profiles name files by module-qualified import path,
//! `example.com/mod/pkg/file.go`. Stripping the module prefix yields the
//! path relative to the module root, which locates both the input under the
//! source directory and the instrumented copy under the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Strip the module prefix from a profiled file path. A profile entry outside
/// the module cannot be located on disk and fails the run.
pub fn strip_module(module: &str, profiled: &str) -> Result<PathBuf> {
    let module = module.trim_end_matches('/');
    // The match must end on a path-segment boundary; `a.com/mod` is not a
    // prefix of `a.com/module`.
    let rest = match profiled.strip_prefix(module) {
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => bail!("profiled file {:?} is outside module {:?}", profiled, module),
    };
    if rest.is_empty() {
        bail!("profiled file {:?} names the module itself, not a file", profiled);
    }
    Ok(rest.split('/').collect())
}

pub fn read_source(src_dir: &Path, rel: &Path) -> Result<String> {
    let path = src_dir.join(rel);
    fs::read_to_string(&path).with_context(|| format!("reading source file {}", path.display()))
}

/// Write one instrumented file, creating intermediate directories as needed.
pub fn write_source(out_dir: &Path, rel: &Path, text: &str) -> Result<PathBuf> {
    let path = out_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_module_prefix() {
        let rel = strip_module("example.com/mod", "example.com/mod/pkg/file.go").unwrap();
        assert_eq!(rel, PathBuf::from("pkg").join("file.go"));
    }

    #[test]
    fn test_module_root_file() {
        let rel = strip_module("example.com/mod", "example.com/mod/main.go").unwrap();
        assert_eq!(rel, PathBuf::from("main.go"));
    }

    #[test]
    fn test_trailing_slash_on_module_is_tolerated() {
        let rel = strip_module("example.com/mod/", "example.com/mod/a.go").unwrap();
        assert_eq!(rel, PathBuf::from("a.go"));
    }

    #[test]
    fn test_path_outside_module_fails() {
        let err = strip_module("example.com/mod", "other.org/dep/a.go").unwrap_err();
        assert!(err.to_string().contains("outside module"));
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let written =
            write_source(dir.path(), Path::new("deep/nested/x.go"), "package x\n").unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "package x\n");
    }
}
