use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use paramcheck_core::{ObjectCheckOutcome, ObjectParam};
use serde_json::Value;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::document::SchemaDocument;
use crate::error::{RegistryError, Result};

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Name-keyed registry of compiled schema documents.
pub struct SchemaRegistry {
    schemas: BTreeMap<String, ObjectParam<Value>>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            schemas: BTreeMap::new(),
            config,
        }
    }

    /// Register a schema document from a JSON string.
    pub fn register(&mut self, name: &str, document_json: &str) -> Result<()> {
        let document = SchemaDocument::from_json(document_json)?;
        self.register_document(name, &document)
    }

    /// Register an already-parsed schema document.
    pub fn register_document(&mut self, name: &str, document: &SchemaDocument) -> Result<()> {
        ensure_schema_name(name)?;
        let compiled = document.compile()?;
        debug!(schema = name, "registered schema");
        self.schemas.insert(name.to_string(), compiled);
        Ok(())
    }

    /// Register a parameter tree built in code.
    pub fn register_param(&mut self, name: &str, param: ObjectParam<Value>) -> Result<()> {
        ensure_schema_name(name)?;
        debug!(schema = name, "registered schema");
        self.schemas.insert(name.to_string(), param);
        Ok(())
    }

    /// Load `<name>.schema.json` documents from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded_schema_count = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| RegistryError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| RegistryError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(name) = file_name.strip_suffix(SCHEMA_SUFFIX) else {
                continue;
            };
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| RegistryError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                return Err(RegistryError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }
            if !is_valid_schema_name(name) {
                return Err(RegistryError::LoadFailed(format!(
                    "unrecognized schema filename: {file_name}"
                )));
            }

            loaded_schema_count = loaded_schema_count.saturating_add(1);
            if loaded_schema_count > registry.config.max_schemas_from_directory {
                return Err(RegistryError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {}",
                    registry.config.max_schemas_from_directory, loaded_schema_count
                )));
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                RegistryError::LoadFailed(format!(
                    "failed opening schema {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| RegistryError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(RegistryError::LoadFailed(format!(
                        "schema file changed during load: {file_name}"
                    )));
                }
            }

            if opened_metadata.len() > registry.config.max_schema_file_size as u64 {
                return Err(RegistryError::LoadFailed(format!(
                    "schema file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let max_bytes = registry.config.max_schema_file_size;
            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    RegistryError::LoadFailed(format!(
                        "failed reading schema {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(RegistryError::LoadFailed(format!(
                    "schema file too large while reading: {file_name}"
                )));
            }

            registry.register(name, &content)?;
        }

        debug!(
            path = %path.display(),
            count = registry.schemas.len(),
            "loaded schemas from directory"
        );
        Ok(registry)
    }

    /// Load from embedded `(name, document)` pairs.
    pub fn from_embedded(schemas: &[(&str, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (name, document) in schemas {
            registry.register(name, document)?;
        }
        Ok(registry)
    }

    /// Check `payload` against the schema registered under `name`.
    pub fn check(&self, name: &str, payload: &mut Value) -> Result<ObjectCheckOutcome> {
        let schema = self
            .schemas
            .get(name)
            .ok_or_else(|| RegistryError::NoSchema(name.to_string()))?;
        Ok(schema.check(payload))
    }

    pub fn get(&self, name: &str) -> Option<&ObjectParam<Value>> {
        self.schemas.get(name)
    }

    /// Check if a schema is registered under `name`.
    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_schema_name(name: &str) -> Result<()> {
    if is_valid_schema_name(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidDocument(format!(
            "invalid schema name: '{name}'"
        )))
    }
}

fn is_valid_schema_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !name.starts_with('.')
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use paramcheck_core::ErrorKind;
    use serde_json::json;

    use super::*;

    const USER_SCHEMA: &str = r#"{
        "required": [
            {"name": "id", "type": "integer", "min": 1},
            {"name": "name", "type": "string", "non_empty": true}
        ]
    }"#;

    #[test]
    fn register_and_check() {
        let mut registry = SchemaRegistry::new();
        registry.register("user", USER_SCHEMA).unwrap();

        let outcome = registry.check("user", &mut json!({"id": 1, "name": "ok"})).unwrap();
        assert!(outcome.is_ok());

        let failure = registry
            .check("user", &mut json!({"id": "bad", "name": "ok"}))
            .unwrap()
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::ParameterCastFailure);
    }

    #[test]
    fn unknown_schema_name_is_an_error() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.check("ghost", &mut json!({})),
            Err(RegistryError::NoSchema(name)) if name == "ghost"
        ));
    }

    #[test]
    fn invalid_documents_fail_registration() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register("bad", "not-json"),
            Err(RegistryError::Json(_))
        ));
        assert!(matches!(
            registry.register("bad", r#"{"required": [{"name": "x", "type": "integer"}, {"name": "x", "type": "string"}]}"#),
            Err(RegistryError::Schema(_))
        ));
        assert!(matches!(
            registry.register("../escape", USER_SCHEMA),
            Err(RegistryError::InvalidDocument(_))
        ));
        assert!(!registry.has_schema("bad"));
    }

    #[test]
    fn from_embedded_loads_schemas() {
        let registry = SchemaRegistry::from_embedded(&[
            ("user", USER_SCHEMA),
            ("flag", r#"{"required": [{"name": "on", "type": "boolean"}]}"#),
        ])
        .unwrap();

        assert!(registry.has_schema("user"));
        assert!(registry.has_schema("flag"));
        assert_eq!(registry.names(), vec!["flag", "user"]);
    }

    #[test]
    fn registered_params_are_checked_like_documents() {
        let mut registry = SchemaRegistry::new();
        let param = crate::document::SchemaDocument::from_json(USER_SCHEMA)
            .unwrap()
            .compile()
            .unwrap();
        registry.register_param("user", param.clone()).unwrap();
        assert!(registry.get("user").is_some());
        assert!(registry
            .check("user", &mut json!({"id": 0, "name": "x"}))
            .unwrap()
            .is_err());

        for bad in ["", ".hidden", "a/b", "../user"] {
            assert!(matches!(
                registry.register_param(bad, param.clone()),
                Err(RegistryError::InvalidDocument(_))
            ));
        }
        assert_eq!(registry.names(), vec!["user"]);
    }

    #[test]
    fn from_directory_loads_and_checks() {
        let dir = make_temp_schema_dir("from-directory");

        write_schema(&dir, "user.schema.json", USER_SCHEMA);
        write_schema(
            &dir,
            "tags.schema.json",
            r#"{"required": [{"name": "tags", "type": "array", "non_empty": true}]}"#,
        );

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert!(registry
            .check("user", &mut json!({"id": 5, "name": "ok"}))
            .unwrap()
            .is_ok());
        assert!(registry
            .check("tags", &mut json!({"tags": [1, 2, 3]}))
            .unwrap()
            .is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "paramcheck-json-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        let path = dir.join(file_name);
        std::fs::write(path, contents.as_bytes()).unwrap();
    }

    #[test]
    fn config_access_and_invalid_file_name_errors() {
        let config = RegistryConfig {
            max_schemas_from_directory: 8,
            max_schema_file_size: 1024,
        };
        let registry = SchemaRegistry::with_config(config);
        assert_eq!(registry.config(), &config);

        let dir = make_temp_schema_dir("bad-name");
        write_schema(&dir, "has space.schema.json", USER_SCHEMA);
        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(RegistryError::LoadFailed(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn only_schema_files_are_loaded() {
        let dir = make_temp_schema_dir("extensions");
        write_schema(&dir, "user.schema.json", USER_SCHEMA);
        write_schema(&dir, "ignored.json", "not even json");
        std::fs::create_dir_all(dir.join("nested.schema.json")).unwrap();

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.names(), vec!["user"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink-schema");
        let target = dir.join("target.json");
        std::fs::write(&target, USER_SCHEMA.as_bytes()).unwrap();
        let link = dir.join("user.schema.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(RegistryError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_count_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-count-limit");
        write_schema(&dir, "a.schema.json", USER_SCHEMA);
        write_schema(&dir, "b.schema.json", USER_SCHEMA);

        let config = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(RegistryError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_file_size_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-size-limit");
        write_schema(&dir, "user.schema.json", USER_SCHEMA);

        let config = RegistryConfig {
            max_schema_file_size: 8,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(RegistryError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_names_are_restricted() {
        assert!(is_valid_schema_name("user"));
        assert!(is_valid_schema_name("orders-v2.create"));
        assert!(!is_valid_schema_name(""));
        assert!(!is_valid_schema_name(".hidden"));
        assert!(!is_valid_schema_name("a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn same_file_identity_distinguishes_replaced_file() {
        let dir = make_temp_schema_dir("identity-check");
        let first = dir.join("first.json");
        let second = dir.join("second.json");
        std::fs::write(&first, USER_SCHEMA).unwrap();
        std::fs::write(&second, USER_SCHEMA).unwrap();

        let first_meta = std::fs::symlink_metadata(&first).unwrap();
        let opened_first_meta = std::fs::File::open(&first).unwrap().metadata().unwrap();
        let opened_second_meta = std::fs::File::open(&second).unwrap().metadata().unwrap();

        assert!(same_file_identity(&first_meta, &opened_first_meta));
        assert!(!same_file_identity(&first_meta, &opened_second_meta));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
