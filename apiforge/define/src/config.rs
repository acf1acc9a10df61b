//! Build configuration for generation runs.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.
//!
//! ```toml
//! package = "petstore"
//! runtime_crate = "apiforge_runtime"
//! dto_module = "crate::dto"
//! server_module = "crate::server"
//! server_name = "PetServer"
//! dto_file = "dto.rs"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating a [`BuildConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML document did not match the configuration shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A name that ends up in generated code is not a valid identifier or path.
    #[error("config field `{field}` is not a valid Rust {expected}: {value:?}")]
    InvalidIdentifier {
        field: &'static str,
        expected: &'static str,
        value: String,
    },

    /// An artifact file name is empty.
    #[error("config field `{field}` must not be empty")]
    EmptyFileName { field: &'static str },

    /// Two artifacts would be written to the same file.
    #[error("artifact file name {name:?} is used more than once")]
    DuplicateFileName { name: String },
}

/// Naming and output settings for one generation run.
///
/// ## Examples
///
/// ```
/// use apiforge_define::BuildConfig;
///
/// let config = BuildConfig::from_toml_str(r#"server_name = "PetServer""#).unwrap();
/// assert_eq!(config.server_name.as_deref(), Some("PetServer"));
/// assert_eq!(config.runtime_crate, "apiforge_runtime");
/// assert_eq!(config.dto_file, "dto.rs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Package name, used in generated module docs.
    pub package: Option<String>,
    /// Path of the runtime crate in generated `use` statements.
    pub runtime_crate: String,
    /// Module path under which the DTO artifact is mounted.
    pub dto_module: String,
    /// Module path under which the server artifact is mounted.
    pub server_module: String,
    /// Overrides the derived server type name.
    pub server_name: Option<String>,
    /// Overrides the derived client type name.
    pub client_name: Option<String>,
    /// DTO artifact file name.
    pub dto_file: String,
    /// Server artifact file name.
    pub server_file: String,
    /// Client artifact file name.
    pub client_file: String,
    /// Application glue file name.
    pub application_file: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            package: None,
            runtime_crate: "apiforge_runtime".to_string(),
            dto_module: "crate::dto".to_string(),
            server_module: "crate::server".to_string(),
            server_name: None,
            client_name: None,
            dto_file: "dto.rs".to_string(),
            server_file: "server.rs".to_string(),
            client_file: "client.rs".to_string(),
            application_file: "application.rs".to_string(),
        }
    }
}

impl BuildConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: BuildConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Overrides the server type name.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Overrides the client type name.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Sets the runtime crate path.
    pub fn with_runtime_crate(mut self, path: impl Into<String>) -> Self {
        self.runtime_crate = path.into();
        self
    }

    /// Checks that generated names are valid and artifact files are distinct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_path("runtime_crate", &self.runtime_crate)?;
        check_path("dto_module", &self.dto_module)?;
        check_path("server_module", &self.server_module)?;
        if let Some(name) = &self.server_name {
            check_ident("server_name", name)?;
        }
        if let Some(name) = &self.client_name {
            check_ident("client_name", name)?;
        }

        let mut seen = HashSet::new();
        for (field, name) in self.artifact_files() {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyFileName { field });
            }
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateFileName {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Artifact file names keyed by their config field.
    pub fn artifact_files(&self) -> [(&'static str, &str); 4] {
        [
            ("dto_file", self.dto_file.as_str()),
            ("server_file", self.server_file.as_str()),
            ("client_file", self.client_file.as_str()),
            ("application_file", self.application_file.as_str()),
        ]
    }
}

fn is_ident(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    value != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_ident(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if is_ident(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            expected: "identifier",
            value: value.to_string(),
        })
    }
}

fn check_path(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.split("::").all(is_ident) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            expected: "path",
            value: value.to_string(),
        })
    }
}
