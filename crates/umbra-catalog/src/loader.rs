//! Platform definition loading from TOML files.
//!
//! This module handles loading platform definitions from the
//! `platform-catalog/` directory.

use crate::{
    definition::PlatformDefinition,
    error::{CatalogError, Result},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use umbra_core::PlatformId;

/// Loader for platform definitions from TOML files.
pub struct PlatformLoader {
    /// Base directory containing platform definitions
    catalog_dir: PathBuf,
}

impl PlatformLoader {
    /// Create a new loader with the given catalog directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Result<Self> {
        let catalog_dir = catalog_dir.into();

        if !catalog_dir.exists() || !catalog_dir.is_dir() {
            return Err(CatalogError::DirectoryNotFound {
                path: catalog_dir.display().to_string(),
            });
        }

        Ok(Self { catalog_dir })
    }

    /// Create a loader using the default catalog directory.
    ///
    /// Looks for `platform-catalog/` relative to the workspace root.
    ///
    /// # Errors
    /// Returns error if the default directory doesn't exist.
    pub fn with_default_dir() -> Result<Self> {
        // Find workspace root by looking for Cargo.toml with [workspace]
        let mut current_dir = std::env::current_dir()?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                if let Ok(contents) = std::fs::read_to_string(&cargo_toml) {
                    if contents.contains("[workspace]") {
                        let catalog_dir = current_dir.join("platform-catalog");
                        return Self::new(catalog_dir);
                    }
                }
            }

            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        // Fallback: try relative path
        let catalog_dir = PathBuf::from("platform-catalog");
        Self::new(catalog_dir)
    }

    /// Load a single platform definition by ID.
    ///
    /// # Errors
    /// Returns error if the definition file doesn't exist, can't be read, or
    /// is invalid.
    pub fn load(&self, platform_id: &PlatformId) -> Result<PlatformDefinition> {
        let definition = self.find_and_load(platform_id)?;

        definition.validate()?;

        debug!(
            platform_id = %platform_id,
            name = %definition.name(),
            "loaded platform definition"
        );

        Ok(definition)
    }

    /// Load all platform definitions from the catalog directory.
    ///
    /// Files are visited in lexicographic path order so the catalog has a
    /// stable order across runs (the `limit` request parameter takes a
    /// prefix of this order). Invalid definitions are logged as warnings
    /// and skipped.
    ///
    /// # Errors
    /// Returns error if the directory can't be read.
    pub fn load_all(&self) -> Result<Vec<PlatformDefinition>> {
        let mut definitions = Vec::new();

        Self::walk_and_load_recursive(&self.catalog_dir, &mut definitions)?;

        info!(
            count = definitions.len(),
            dir = %self.catalog_dir.display(),
            "loaded platform definitions"
        );

        Ok(definitions)
    }

    /// Recursively walk directory and load all TOML files in sorted order.
    fn walk_and_load_recursive(
        dir: &Path,
        definitions: &mut Vec<PlatformDefinition>,
    ) -> Result<()> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                Self::walk_and_load_recursive(&path, definitions)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                match Self::load_from_path(&path) {
                    Ok(definition) => {
                        if let Err(e) = definition.validate() {
                            warn!(
                                path = %path.display(),
                                error = %e,
                                "skipping invalid platform definition"
                            );
                            continue;
                        }
                        definitions.push(definition);
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to load platform definition"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Find and load a platform definition file by ID.
    fn find_and_load(&self, platform_id: &PlatformId) -> Result<PlatformDefinition> {
        let filename = format!("{}.toml", platform_id.as_str());

        if let Some(path) = Self::find_file_recursive(&self.catalog_dir, &filename)? {
            Self::load_from_path(&path)
        } else {
            Err(CatalogError::NotFound {
                platform_id: platform_id.to_string(),
            })
        }
    }

    /// Recursively search for a file by name.
    fn find_file_recursive(dir: &Path, filename: &str) -> Result<Option<PathBuf>> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                if let Some(found) = Self::find_file_recursive(&path, filename)? {
                    return Ok(Some(found));
                }
            } else if path.file_name().and_then(|s| s.to_str()) == Some(filename) {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    /// Load a platform definition from a specific file path.
    fn load_from_path(path: &Path) -> Result<PlatformDefinition> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::LoadError {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        toml::from_str(&contents).map_err(|e| CatalogError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PlatformCategory;
    use tempfile::TempDir;

    fn create_test_definition_file(dir: &Path, platform_id: &str, category: &str) -> PathBuf {
        let category_dir = dir.join(category);
        std::fs::create_dir_all(&category_dir).expect("create category dir");

        let file_path = category_dir.join(format!("{platform_id}.toml"));

        let content = format!(
            r#"
[platform]
id = "{platform_id}"
name = "Test Platform"
category = "{category}"
url_template = "https://{platform_id}.example.com/{{handle}}"

[detection]
rule = "status-range"
found_min = 200
found_max = 299
"#
        );

        std::fs::write(&file_path, content).expect("write test file");
        file_path
    }

    #[test]
    fn test_loader_new_with_existing_dir() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let loader = PlatformLoader::new(temp_dir.path());
        assert!(loader.is_ok());
    }

    #[test]
    fn test_loader_new_with_nonexistent_dir() {
        let loader = PlatformLoader::new("/nonexistent/path/to/catalog");
        assert!(loader.is_err());
    }

    #[test]
    fn test_load_single_platform() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_test_definition_file(temp_dir.path(), "test-platform", "social");

        let loader = PlatformLoader::new(temp_dir.path()).expect("create loader");
        let platform_id = PlatformId::new("test-platform").expect("valid platform ID");
        let definition = loader.load(&platform_id).expect("load platform definition");

        assert_eq!(definition.id(), &platform_id);
        assert_eq!(definition.name(), "Test Platform");
        assert_eq!(definition.category(), PlatformCategory::Social);
    }

    #[test]
    fn test_load_nonexistent_platform() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let loader = PlatformLoader::new(temp_dir.path()).expect("create loader");
        let platform_id = PlatformId::new("nonexistent").expect("valid platform ID");

        let result = loader.load(&platform_id);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), CatalogError::NotFound { .. }));
    }

    #[test]
    fn test_load_all_platforms() {
        let temp_dir = TempDir::new().expect("create temp dir");

        create_test_definition_file(temp_dir.path(), "platform-a", "social");
        create_test_definition_file(temp_dir.path(), "platform-b", "social");
        create_test_definition_file(temp_dir.path(), "platform-c", "developer");

        let loader = PlatformLoader::new(temp_dir.path()).expect("create loader");
        let definitions = loader.load_all().expect("load all definitions");

        assert_eq!(definitions.len(), 3);

        let ids: std::collections::HashSet<_> =
            definitions.iter().map(PlatformDefinition::id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_load_all_is_sorted() {
        let temp_dir = TempDir::new().expect("create temp dir");

        // Same directory so path order is determined by file name
        create_test_definition_file(temp_dir.path(), "zulip-like", "social");
        create_test_definition_file(temp_dir.path(), "alpha-net", "social");
        create_test_definition_file(temp_dir.path(), "mid-board", "social");

        let loader = PlatformLoader::new(temp_dir.path()).expect("create loader");
        let definitions = loader.load_all().expect("load all definitions");

        let ids: Vec<&str> = definitions.iter().map(|d| d.id().as_str()).collect();
        assert_eq!(ids, vec!["alpha-net", "mid-board", "zulip-like"]);
    }

    #[test]
    fn test_load_all_skips_invalid() {
        let temp_dir = TempDir::new().expect("create temp dir");

        create_test_definition_file(temp_dir.path(), "valid-platform", "social");

        let invalid_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&invalid_path, "invalid toml content [[[").expect("write invalid file");

        // Valid TOML but fails validation (no {handle} placeholder)
        let unvalidated_path = temp_dir.path().join("no-placeholder.toml");
        std::fs::write(
            &unvalidated_path,
            r#"
[platform]
id = "no-placeholder"
name = "No Placeholder"
category = "other"
url_template = "https://example.com/fixed"

[detection]
rule = "body-contains"
needle = "profile"
"#,
        )
        .expect("write unvalidated file");

        let loader = PlatformLoader::new(temp_dir.path()).expect("create loader");
        let definitions = loader.load_all().expect("load all definitions");

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].id().as_str(), "valid-platform");
    }

    #[test]
    fn test_find_file_in_nested_directories() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let nested_dir = temp_dir.path().join("category").join("subcategory");
        std::fs::create_dir_all(&nested_dir).expect("create nested dir");

        let file_path = nested_dir.join("nested-platform.toml");
        std::fs::write(&file_path, "test").expect("write file");

        let found =
            PlatformLoader::find_file_recursive(temp_dir.path(), "nested-platform.toml")
                .expect("search for file");

        assert!(found.is_some());
        assert_eq!(found.unwrap(), file_path);
    }
}
