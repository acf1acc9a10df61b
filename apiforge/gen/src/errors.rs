//! Error types for the apiforge generator.

use apiforge_define::ConfigError;
use thiserror::Error;

/// Errors that can occur during code generation.
///
/// Every variant names the schema, definition or operation at fault. No
/// placeholder is ever substituted into emitted source in place of an error.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A list whose items are themselves a list.
    #[error("Unsupported nested list in {context}: {schema}")]
    NestedList {
        /// Where the type appeared (e.g. "User.matrix").
        context: String,
        /// Rendering of the offending type.
        schema: String,
    },

    /// A reference to a definition that does not exist.
    #[error("Unresolved reference to '{name}' in {context}")]
    UnresolvedReference {
        /// Where the reference appeared.
        context: String,
        /// The missing definition name.
        name: String,
    },

    /// A synthetic definition collides with an explicit one.
    #[error("Synthetic definition '{name}' collides with explicit definition '{explicit}'")]
    SyntheticCollision {
        /// The synthetic definition name.
        name: String,
        /// The explicit definition it collides with.
        explicit: String,
    },

    /// Two explicit definitions share a name.
    #[error("Definition '{name}' is defined more than once")]
    DuplicateDefinition {
        /// The repeated name.
        name: String,
    },

    /// A definition declares the same property twice.
    #[error("Definition '{definition}' declares property '{property}' more than once")]
    DuplicateProperty {
        /// Owning definition.
        definition: String,
        /// The repeated property name.
        property: String,
    },

    /// Two different operations share a verb and path.
    #[error("Operation '{key}' is defined more than once with different contents")]
    DuplicateOperation {
        /// The repeated `METHOD /path`.
        key: String,
    },

    /// Two distinct model names map to the same generated identifier.
    #[error("Naming collision in {context}: '{first}' and '{second}' both become '{ident}'")]
    NamingCollision {
        /// Scope of the collision (definition, operation, client).
        context: String,
        /// First model name.
        first: String,
        /// Second model name.
        second: String,
        /// The shared generated identifier.
        ident: String,
    },

    /// A rule cannot apply to the type it is attached to.
    #[error("Rule '{rule}' on {context} cannot apply to type {ty}")]
    RuleMismatch {
        /// Field or parameter carrying the rule.
        context: String,
        /// Rendering of the rule.
        rule: String,
        /// Rendering of the type.
        ty: String,
    },

    /// A pattern rule does not compile.
    #[error("Invalid pattern on {context}: {reason}")]
    InvalidPattern {
        /// Field or parameter carrying the rule.
        context: String,
        /// Regex compiler message.
        reason: String,
    },

    /// A rule can never be satisfied or has non-finite bounds.
    #[error("Invalid rule on {context}: {reason}")]
    InvalidRule {
        /// Field or parameter carrying the rule.
        context: String,
        /// What was wrong.
        reason: String,
    },

    /// A default value does not fit its type.
    #[error("Invalid default on {context}: {reason}")]
    InvalidDefault {
        /// Field or parameter carrying the default.
        context: String,
        /// What was wrong.
        reason: String,
    },

    /// An operation reads its body from incompatible sources.
    #[error("Operation '{operation}' mixes request body sources: {reason}")]
    ConflictingBodies {
        /// The operation (`METHOD /path`).
        operation: String,
        /// Which sources conflict.
        reason: String,
    },

    /// Path template placeholders and declared path parameters disagree.
    #[error("Operation '{operation}': path parameter '{name}' {reason}")]
    MissingPathParameter {
        /// The operation (`METHOD /path`).
        operation: String,
        /// The parameter or placeholder name.
        name: String,
        /// Which side is missing it.
        reason: String,
    },

    /// Failed to generate code
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),

    /// The API model could not be loaded.
    #[error("Failed to load API model '{path}': {reason}")]
    ModelError {
        /// Model file path.
        path: String,
        /// Read or parse failure.
        reason: String,
    },

    /// Failed to write output file
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An artifact was skipped because one it refers to failed.
    #[error("Skipped '{artifact}': it depends on '{dependency}', which failed")]
    DependencyFailed {
        /// The skipped artifact's file name.
        artifact: String,
        /// The failed artifact's file name.
        dependency: String,
    },

    /// One or more artifacts failed; the others were emitted.
    #[error("{} artifact(s) failed: {}", failures.len(), summarize(failures))]
    ArtifactsFailed {
        /// Artifact file name and the error that aborted it.
        failures: Vec<(String, GeneratorError)>,
    },
}

fn summarize(failures: &[(String, GeneratorError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
