//! Loads role schemas from a directory.
//!
//! Files are named `role_schema_<role>.<ext>` with `<ext>` one of `yaml`,
//! `yml` or `json`. The business role is also found under its legacy name
//! `role_schema_fach`.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::interview::schema::{RoleSchema, SchemaError, SchemaStore};
use crate::domain::interview::Role;

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

#[derive(Debug, Clone)]
pub struct FileSchemaLoader {
    dir: PathBuf,
}

impl FileSchemaLoader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn file_stems(role: Role) -> &'static [&'static str] {
        match role {
            Role::It => &["role_schema_it"],
            Role::Business => &["role_schema_business", "role_schema_fach"],
            Role::Management => &["role_schema_management"],
        }
    }

    /// First existing schema file for `role`, canonical name before legacy.
    async fn find_file(&self, role: Role) -> Option<PathBuf> {
        for stem in Self::file_stems(role) {
            for ext in EXTENSIONS {
                let path = self.dir.join(format!("{}.{}", stem, ext));
                if fs::try_exists(&path).await.unwrap_or(false) {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Loads the schema for `role`, or `None` when the directory has none.
    ///
    /// # Errors
    ///
    /// - `Io` if the file can't be read
    /// - `Parse` / `Invalid` if the content is broken
    /// - `Invalid` if the file declares a different role
    pub async fn load_role(&self, role: Role) -> Result<Option<RoleSchema>, SchemaError> {
        let Some(path) = self.find_file(role).await else {
            return Ok(None);
        };
        let source_name = path.display().to_string();
        let text = fs::read_to_string(&path).await.map_err(|e| SchemaError::Io {
            path: source_name.clone(),
            message: e.to_string(),
        })?;

        let schema = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            RoleSchema::from_json(&text, &source_name)?
        } else {
            RoleSchema::from_yaml(&text, &source_name)?
        };

        if schema.role != role {
            return Err(SchemaError::invalid(
                role,
                format!("{} declares role '{}'", source_name, schema.role),
            ));
        }
        tracing::info!(role = %role, path = %source_name, "schema loaded");
        Ok(Some(schema))
    }

    /// Replaces schemas in `store` with those found in the directory.
    /// Returns the overridden roles.
    pub async fn apply_to(&self, store: &mut SchemaStore) -> Result<Vec<Role>, SchemaError> {
        let mut overridden = Vec::new();
        for role in Role::ALL {
            if let Some(schema) = self.load_role(role).await? {
                store.insert(schema);
                overridden.push(role);
            }
        }
        if overridden.is_empty() {
            tracing::warn!(dir = %self.dir.display(), "schema directory contains no role schemas");
        }
        Ok(overridden)
    }
}
