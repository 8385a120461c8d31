//! Loading of text resources named by locators.
//!
//! Locators follow the `classpath:` convention of rule-engine test suites:
//!
//! | Locator | Lookup |
//! |---------|--------|
//! | `classpath:/a/b.json`, `classpath*:a/b.json` | relative to each root, in order |
//! | `file:/abs/b.json`, `file:rel/b.json` | the path itself |
//! | `/abs/b.json` | the path itself |
//! | `a/b.json` | relative to each root, in order |

use std::path::{Path, PathBuf};

use crate::config::ResourceConfig;
use crate::error::{Result, StepError};

/// Reads the text behind a resource locator.
pub trait ResourceLoader {
    /// Load the full content of the resource as UTF-8 text.
    fn load_text(&self, locator: &str) -> Result<String>;
}

/// Where a locator points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location<'a> {
    /// Search each root.
    Rooted(&'a str),
    /// Use the path as given.
    Direct(&'a Path),
}

fn locate(locator: &str) -> Location<'_> {
    let locator = locator.trim();
    if let Some(rest) = locator
        .strip_prefix("classpath*:")
        .or_else(|| locator.strip_prefix("classpath:"))
    {
        return Location::Rooted(rest.trim_start_matches('/'));
    }
    if let Some(rest) = locator.strip_prefix("file:") {
        return Location::Direct(Path::new(rest));
    }
    let path = Path::new(locator);
    if path.is_absolute() {
        Location::Direct(path)
    } else {
        Location::Rooted(locator)
    }
}

/// Resolves locators against a list of root directories.
#[derive(Debug, Clone, Default)]
pub struct ClasspathLoader {
    roots: Vec<PathBuf>,
}

impl ClasspathLoader {
    /// Create a loader without roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader from configuration.
    #[must_use]
    pub fn from_config(config: &ResourceConfig) -> Self {
        Self {
            roots: config.roots.clone(),
        }
    }

    /// Add a root directory, searched after those already added.
    #[must_use]
    pub fn add_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// The root directories.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Every path a locator may refer to, in lookup order.
    #[must_use]
    pub fn candidates(&self, locator: &str) -> Vec<PathBuf> {
        match locate(locator) {
            Location::Direct(path) => vec![path.to_path_buf()],
            Location::Rooted(relative) => {
                self.roots.iter().map(|root| root.join(relative)).collect()
            }
        }
    }

    /// The first existing file for a locator.
    #[must_use]
    pub fn find(&self, locator: &str) -> Option<PathBuf> {
        self.candidates(locator).into_iter().find(|p| p.is_file())
    }
}

impl ResourceLoader for ClasspathLoader {
    fn load_text(&self, locator: &str) -> Result<String> {
        let candidates = self.candidates(locator);
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(StepError::ResourceNotFound {
                locator: locator.to_string(),
                searched: candidates,
            });
        };

        tracing::debug!(locator, path = %path.display(), "loading resource");
        std::fs::read_to_string(path).map_err(|e| StepError::resource(locator, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_forms() {
        assert_eq!(locate("classpath:/a/b.json"), Location::Rooted("a/b.json"));
        assert_eq!(locate("classpath*:a.json"), Location::Rooted("a.json"));
        assert_eq!(locate("rel/a.json"), Location::Rooted("rel/a.json"));
        assert_eq!(
            locate("file:rel/a.json"),
            Location::Direct(Path::new("rel/a.json"))
        );
    }

    #[test]
    fn candidates_follow_root_order() {
        let loader = ClasspathLoader::new().add_root("one").add_root("two");
        assert_eq!(
            loader.candidates("classpath:/x.yaml"),
            vec![PathBuf::from("one/x.yaml"), PathBuf::from("two/x.yaml")]
        );
    }

    #[test]
    fn loads_from_second_root() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::create_dir(second.path().join("data")).unwrap();
        std::fs::write(second.path().join("data/d.json"), "{\"a\": 1}").unwrap();

        let loader = ClasspathLoader::new()
            .add_root(first.path())
            .add_root(second.path());
        let text = loader.load_text("classpath:/data/d.json").unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[test]
    fn file_locator_ignores_roots() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("direct.yaml");
        std::fs::write(&file, "a: 1\n").unwrap();

        let loader = ClasspathLoader::new();
        let locator = format!("file:{}", file.display());
        assert_eq!(loader.load_text(&locator).unwrap(), "a: 1\n");
    }

    #[test]
    fn missing_resource_lists_candidates() {
        let loader = ClasspathLoader::new().add_root("nowhere");
        let err = loader.load_text("classpath:/missing.json").unwrap_err();
        match err {
            StepError::ResourceNotFound { locator, searched } => {
                assert_eq!(locator, "classpath:/missing.json");
                assert_eq!(searched, vec![PathBuf::from("nowhere/missing.json")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin.json"), [0xff, 0xfe, 0x00]).unwrap();

        let loader = ClasspathLoader::new().add_root(dir.path());
        let err = loader.load_text("bin.json").unwrap_err();
        assert!(matches!(err, StepError::Resource { .. }));
    }
}
