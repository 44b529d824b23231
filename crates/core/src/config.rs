//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. The intent is to avoid reading process-wide environment
//! variables during operations, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses — binaries read the
//! environment, the core reads `CoreConfig`.

use crate::catalog::ChecklistCatalog;
use crate::{PostError, PostResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    catalog_path: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `catalog_path`, when provided, must point at an existing file; passing
    /// a bad path should fail at startup rather than on first checklist use.
    pub fn new(data_dir: PathBuf, catalog_path: Option<PathBuf>) -> PostResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(PostError::Validation("data directory cannot be empty".into()));
        }

        if let Some(path) = &catalog_path {
            if !path.is_file() {
                return Err(PostError::Validation(format!(
                    "checklist catalogue is not a readable file: {}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            data_dir,
            catalog_path,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog_path(&self) -> Option<&Path> {
        self.catalog_path.as_deref()
    }

    /// Loads the checklist catalogue.
    ///
    /// Falls back to the built-in default catalogue when no file is
    /// configured.
    pub fn load_catalog(&self) -> PostResult<ChecklistCatalog> {
        match &self.catalog_path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(PostError::CatalogRead)?;
                ChecklistCatalog::from_yaml(&text)
            }
            None => {
                tracing::debug!("no checklist catalogue configured; using built-in default");
                Ok(ChecklistCatalog::builtin())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_missing_catalogue_file_at_startup() {
        let err = CoreConfig::new(
            PathBuf::from("/tmp/post"),
            Some(PathBuf::from("/nonexistent/catalog.yaml")),
        )
        .expect_err("bad path should fail");
        assert!(matches!(err, PostError::Validation(_)));
    }

    #[test]
    fn loads_catalogue_from_configured_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "categories:\n  - name: Power\n    items: [Generator fuelled]\n"
        )
        .expect("write");

        let config = CoreConfig::new(
            PathBuf::from("/tmp/post"),
            Some(file.path().to_path_buf()),
        )
        .expect("config");

        let catalog = config.load_catalog().expect("catalogue");
        assert_eq!(catalog.item_count(), 1);
    }

    #[test]
    fn falls_back_to_builtin_catalogue() {
        let config = CoreConfig::new(PathBuf::from("/tmp/post"), None).expect("config");
        let catalog = config.load_catalog().expect("catalogue");
        assert!(catalog.contains_item("Generator fuelled"));
    }
}
