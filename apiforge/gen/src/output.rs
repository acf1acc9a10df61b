//! Output assembly and emission for generated code.
//!
//! This module handles the final phase of code generation: assembling each
//! artifact from its module documentation and generated items, validating
//! the output, formatting it, and handing the text to an [`Emitter`].
//!
//! ## Output Structure
//!
//! With the default [`BuildConfig`] a run produces:
//! ```text
//! src/
//! ├── dto.rs          # Data transfer objects with codecs
//! ├── server.rs       # Server struct, route registration, handlers
//! ├── client.rs       # Client SDK
//! └── application.rs  # Router glue
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: All generated code is validated with `syn` before emission
//! - **Formatting**: Output is formatted with `prettyplease` for consistent style
//! - **Atomic writes**: [`DirectoryEmitter`] uses temp file + rename
//! - **Isolation**: A failing artifact only stops the artifacts that refer to it

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use apiforge_define::{ApiModel, BuildConfig};
use proc_macro2::TokenStream;
use quote::quote;
use tracing::{debug, info, warn};

use crate::codegen::{
    Context, ModuleDocBuilder, ModuleKind, generate_application, generate_client, generate_dtos,
    generate_server,
};
use crate::errors::GeneratorError;
use crate::validation::validate_model;

/// Notice prepended to every generated file.
pub const GENERATED_HEADER: &str =
    "// This code was automatically generated by apiforge-gen. Do not edit manually.\n\n";

/// One generated source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Dto,
    Server,
    Client,
    Application,
}

impl Artifact {
    /// Every artifact, in emission order.
    pub const ALL: [Artifact; 4] = [
        Artifact::Dto,
        Artifact::Server,
        Artifact::Client,
        Artifact::Application,
    ];

    /// The configured file name of this artifact.
    pub fn file_name(self, config: &BuildConfig) -> &str {
        match self {
            Artifact::Dto => &config.dto_file,
            Artifact::Server => &config.server_file,
            Artifact::Client => &config.client_file,
            Artifact::Application => &config.application_file,
        }
    }

    fn module_kind(self) -> ModuleKind {
        match self {
            Artifact::Dto => ModuleKind::Dto,
            Artifact::Server => ModuleKind::Server,
            Artifact::Client => ModuleKind::Client,
            Artifact::Application => ModuleKind::Application,
        }
    }

    /// Artifacts whose items this one refers to.
    ///
    /// Server and client import the DTOs; the application glue calls the
    /// server's registration functions.
    pub fn dependencies(self) -> &'static [Artifact] {
        match self {
            Artifact::Dto => &[],
            Artifact::Server | Artifact::Client => &[Artifact::Dto],
            Artifact::Application => &[Artifact::Server],
        }
    }

    fn items(self, ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
        match self {
            Artifact::Dto => generate_dtos(ctx),
            Artifact::Server => generate_server(ctx),
            Artifact::Client => generate_client(ctx),
            Artifact::Application => generate_application(ctx),
        }
    }
}

/// Destination for generated source text.
pub trait Emitter {
    /// Receives one complete artifact.
    ///
    /// ## Errors
    ///
    /// Implementations return [`GeneratorError::WriteError`] when the
    /// artifact cannot be stored.
    fn emit(&mut self, name: &str, contents: &str) -> Result<(), GeneratorError>;
}

/// Writes artifacts into a directory, atomically per file.
#[derive(Debug, Clone)]
pub struct DirectoryEmitter {
    root: PathBuf,
}

impl DirectoryEmitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Emitter for DirectoryEmitter {
    fn emit(&mut self, name: &str, contents: &str) -> Result<(), GeneratorError> {
        write_atomic(&self.root.join(name), contents)
    }
}

/// Prints artifacts to stdout instead of writing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunEmitter;

impl Emitter for DryRunEmitter {
    fn emit(&mut self, name: &str, contents: &str) -> Result<(), GeneratorError> {
        println!("=== {} ===\n{}\n", name, contents);
        Ok(())
    }
}

/// Keeps artifacts in memory, keyed by file name.
#[derive(Debug, Default, Clone)]
pub struct MemoryEmitter {
    files: BTreeMap<String, String>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of an emitted artifact.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, String> {
        self.files
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&mut self, name: &str, contents: &str) -> Result<(), GeneratorError> {
        self.files.insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// Validates generated code using syn.
///
/// Parses the token stream as a complete Rust file to ensure it's syntactically
/// valid before it is emitted.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if the code fails to parse.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats generated code using prettyplease.
///
/// Converts a parsed syn::File back to a nicely formatted string,
/// prepending [`GENERATED_HEADER`] as a regular comment.
pub fn format_code(file: &syn::File) -> String {
    let formatted = prettyplease::unparse(file);
    format!("{}{}", GENERATED_HEADER, formatted)
}

/// Writes content to a file atomically using temp file + rename.
///
/// Other processes see either the old or the new content, never a mix.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if:
/// - Parent directories cannot be created
/// - The temp file cannot be written
/// - The rename operation fails
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Renders one artifact to formatted source text.
///
/// The model is assumed to have passed [`validate_model`].
///
/// ## Errors
///
/// Returns the compiler's error for this artifact, or
/// `GeneratorError::CodeGenError` if the assembled tokens do not parse.
pub fn render_artifact(
    model: &ApiModel,
    config: &BuildConfig,
    artifact: Artifact,
) -> Result<String, GeneratorError> {
    let ctx = Context::new(model, config);
    let docs = ModuleDocBuilder::new(model, artifact.module_kind()).build();
    let items = artifact.items(&ctx)?;
    let tokens = quote! {
        #docs
        #items
    };
    let file = validate_code(&tokens)?;
    Ok(format_code(&file))
}

/// Generates every artifact and hands each to `emitter`.
///
/// The model and configuration are validated first; a validation failure
/// aborts the run before anything is emitted. After that an artifact that
/// fails does not stop the others, except those that depend on it (see
/// [`Artifact::dependencies`]), which are skipped. The failures are reported
/// together.
///
/// ## Returns
///
/// The names of the emitted files, in emission order.
///
/// ## Errors
///
/// Returns the validation error, or `GeneratorError::ArtifactsFailed`
/// listing every artifact that could not be rendered or emitted.
pub fn generate(
    model: &ApiModel,
    config: &BuildConfig,
    emitter: &mut dyn Emitter,
) -> Result<Vec<String>, GeneratorError> {
    validate_model(model, config)?;

    let mut emitted = Vec::new();
    let mut failures = Vec::new();
    let mut failed: Vec<Artifact> = Vec::new();
    for artifact in Artifact::ALL {
        let name = artifact.file_name(config).to_string();
        let broken = artifact
            .dependencies()
            .iter()
            .find(|dependency| failed.contains(dependency));
        let result = match broken {
            Some(dependency) => Err(GeneratorError::DependencyFailed {
                artifact: name.clone(),
                dependency: dependency.file_name(config).to_string(),
            }),
            None => {
                debug!(artifact = %name, "rendering artifact");
                render_artifact(model, config, artifact)
                    .and_then(|contents| emitter.emit(&name, &contents).map(|()| contents.len()))
            }
        };
        match result {
            Ok(bytes) => {
                info!(artifact = %name, bytes, "emitted artifact");
                emitted.push(name);
            }
            Err(err) => {
                warn!(artifact = %name, error = %err, "artifact failed");
                failed.push(artifact);
                failures.push((name, err));
            }
        }
    }

    if failures.is_empty() {
        Ok(emitted)
    } else {
        Err(GeneratorError::ArtifactsFailed { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{petstore_model, user_model};
    use apiforge_define::{Definition, HttpMethod, PathMethodModel, PathModel, Property, TypeRef};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    // === validate_code / format_code tests ===

    #[test]
    fn validate_code_rejects_broken_tokens() {
        let tokens = quote! { fn broken() -> };
        match validate_code(&tokens) {
            Err(err) => assert!(err.to_string().contains("Generated code is invalid")),
            Ok(_) => panic!("broken tokens should not parse"),
        }
    }

    #[test]
    fn format_code_prepends_header() {
        let file = validate_code(&quote! { pub struct A; }).unwrap();
        let code = format_code(&file);
        assert!(code.starts_with(GENERATED_HEADER));
        assert!(code.contains("pub struct A;"));
    }

    // === write_atomic tests ===

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/dto.rs");
        write_atomic(&path, "// content").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "// content");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.rs");
        write_atomic(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    // === render_artifact tests ===

    #[test]
    fn rendered_artifacts_start_with_docs() {
        let model = petstore_model();
        let config = BuildConfig::default();
        let server = render_artifact(&model, &config, Artifact::Server).unwrap();
        assert!(server.starts_with(GENERATED_HEADER));
        assert!(server.contains("//! Server routes for Petstore"));
        assert!(server.contains("pub struct PetstoreServer<A: Authenticator>"));

        let dto = render_artifact(&model, &config, Artifact::Dto).unwrap();
        assert!(dto.contains("//! Data transfer objects for Petstore"));
        assert!(dto.contains("pub struct Pet {"));
    }

    // === generate tests ===

    #[test]
    fn generate_emits_all_artifacts_in_order() {
        let mut emitter = MemoryEmitter::new();
        let names = generate(&petstore_model(), &BuildConfig::default(), &mut emitter).unwrap();
        assert_eq!(names, vec!["dto.rs", "server.rs", "client.rs", "application.rs"]);
        assert_eq!(emitter.files().len(), 4);
        assert!(emitter.get("client.rs").unwrap().contains("pub struct PetstoreClient"));
    }

    #[test]
    fn generate_honors_configured_file_names() {
        let config = BuildConfig {
            dto_file: "models.rs".to_string(),
            ..BuildConfig::default()
        };
        let mut emitter = MemoryEmitter::new();
        generate(&user_model(), &config, &mut emitter).unwrap();
        assert!(emitter.get("models.rs").is_some());
        assert!(emitter.get("dto.rs").is_none());
    }

    #[test]
    fn directory_emitter_writes_files() {
        let dir = TempDir::new().unwrap();
        let mut emitter = DirectoryEmitter::new(dir.path().join("src"));
        generate(&petstore_model(), &BuildConfig::default(), &mut emitter).unwrap();
        for name in ["dto.rs", "server.rs", "client.rs", "application.rs"] {
            let content = fs::read_to_string(emitter.root().join(name)).unwrap();
            assert!(content.starts_with(GENERATED_HEADER), "{name} lacks header");
        }
    }

    #[test]
    fn invalid_model_emits_nothing() {
        let model = ApiModel::new("T").with_route(
            PathModel::new("/x/{id}").with_method(PathMethodModel::new(HttpMethod::Get, "/x/{id}")),
        );
        let mut emitter = MemoryEmitter::new();
        let err = generate(&model, &BuildConfig::default(), &mut emitter).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingPathParameter { .. }));
        assert!(emitter.files().is_empty());
    }

    #[test]
    fn dto_failure_skips_everything_that_imports_it() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("Pet").with_property(Property::required("owner", TypeRef::reference("Ghost"))),
        );
        let mut emitter = MemoryEmitter::new();
        let err = generate(&model, &BuildConfig::default(), &mut emitter).unwrap_err();
        match err {
            GeneratorError::ArtifactsFailed { failures } => {
                assert!(matches!(&failures[0].1, GeneratorError::UnresolvedReference { .. }));
                for (name, err) in &failures[1..] {
                    assert!(matches!(err, GeneratorError::DependencyFailed { .. }), "{name}");
                }
                assert_eq!(failures.len(), 4);
            }
            other => panic!("Expected ArtifactsFailed, got: {:?}", other),
        }
        assert!(emitter.files().is_empty());
    }

    #[test]
    #[traced_test]
    fn failing_artifacts_do_not_block_the_rest() {
        let model = ApiModel::new("T").with_route(
            PathModel::new("/ghost").with_method(
                PathMethodModel::new(HttpMethod::Get, "/ghost").with_response(TypeRef::reference("Ghost")),
            ),
        );
        let mut emitter = MemoryEmitter::new();
        let err = generate(&model, &BuildConfig::default(), &mut emitter).unwrap_err();

        match err {
            GeneratorError::ArtifactsFailed { failures } => {
                let names: Vec<&str> = failures.iter().map(|(name, _)| name.as_str()).collect();
                assert_eq!(names, vec!["server.rs", "client.rs", "application.rs"]);
                assert!(failures[..2].iter().all(|(_, e)| matches!(
                    e,
                    GeneratorError::UnresolvedReference { name, .. } if name == "Ghost"
                )));
                assert!(matches!(
                    &failures[2].1,
                    GeneratorError::DependencyFailed { artifact, dependency }
                        if artifact == "application.rs" && dependency == "server.rs"
                ));
            }
            other => panic!("Expected ArtifactsFailed, got: {:?}", other),
        }
        assert!(emitter.get("dto.rs").is_some());
        assert!(emitter.get("application.rs").is_none());
        assert!(logs_contain("artifact failed"));
        assert!(logs_contain("emitted artifact"));
    }
}
