//! Resolve module paths from a directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{LoadedUnit, ResolveError, Resolver};

/// Loads units from files under a root directory.
///
/// Identifiers are relative paths; a leading `./` or `/` is ignored, and
/// anything that would climb out of the root is rejected.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, id: &str) -> Result<PathBuf, ResolveError> {
        let relative = Path::new(id.trim_start_matches('/'));
        let mut path = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return Err(ResolveError::InvalidIdentifier(id.to_string())),
            }
        }

        if path == self.root {
            return Err(ResolveError::InvalidIdentifier(id.to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
impl Resolver for FileResolver {
    type Output = LoadedUnit;
    type Error = ResolveError;

    async fn resolve(&self, id: &str) -> Result<LoadedUnit, ResolveError> {
        let path = self.locate(id)?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ResolveError::NotFound(id.to_string())
            } else {
                ResolveError::Io(e)
            }
        })?;

        debug!("Loaded {} from {}", id, path.display());
        Ok(LoadedUnit {
            id: id.to_string(),
            origin: path.display().to_string(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("modules")).unwrap();
        std::fs::write(dir.path().join("modules/toolbar.js"), "export default 1;").unwrap();

        let resolver = FileResolver::new(dir.path());
        let unit = resolver.resolve("./modules/toolbar.js").await.unwrap();

        assert_eq!(unit.id, "./modules/toolbar.js");
        assert_eq!(unit.content, "export default 1;");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FileResolver::new(dir.path());

        let err = resolver.resolve("nope.js").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(id) if id == "nope.js"));
    }

    #[tokio::test]
    async fn test_rejects_escaping_root() {
        let resolver = FileResolver::new("/srv/modules");

        for id in ["../secret.js", "a/../../b.js", "", "."] {
            let err = resolver.resolve(id).await.unwrap_err();
            assert!(matches!(err, ResolveError::InvalidIdentifier(_)), "{id}");
        }
    }
}
