//! Pre-generation checks on the API model.
//!
//! Generation assumes every name it derives is unique in its scope and every
//! operation is structurally sound. [`validate_model`] checks those
//! assumptions up front, so a bad model fails with one error naming the
//! offending definition or operation instead of producing code that does not
//! compile.
//!
//! ## Validation Checks
//!
//! - **Definitions**: names are unique, synthetic names never collide with
//!   explicit ones, and distinct names never map to the same type identifier
//! - **Properties**: unique per definition, distinct field identifiers
//! - **Operations**: a `(method, path)` pair is declared once (or repeated
//!   identically), method names are unique across the client, and parameter
//!   bindings are unique per operation
//! - **Path parameters**: template placeholders and declared path parameters
//!   match one to one, and templates that differ only in placeholder names
//!   are rejected
//! - **Bodies**: an operation reads its body from one source only
//! - **Configuration**: see [`BuildConfig::validate`]
//!
//! ## Examples
//!
//! ```
//! use apiforge_define::{ApiModel, BuildConfig, HttpMethod, Parameter, PathMethodModel, PathModel, TypeRef};
//! use apiforge_gen::validation::validate_model;
//!
//! let model = ApiModel::new("Petstore").with_route(
//!     PathModel::new("/pets/{id}").with_method(
//!         PathMethodModel::new(HttpMethod::Get, "/pets/{id}")
//!             .with_parameter(Parameter::path("id", TypeRef::int())),
//!     ),
//! );
//!
//! assert!(validate_model(&model, &BuildConfig::default()).is_ok());
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use apiforge_define::{ApiModel, BuildConfig, Definition, Location, OperationKey, PathMethodModel};
use tracing::debug;

use crate::errors::GeneratorError;
use crate::naming::{binding_name, field_ident, operation_name, type_ident};
use crate::parser::{extract_path_params, route_shape};

/// Names the DTO module imports from the runtime or relies on from the
/// prelude. A definition may not take any of them.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Codec",
    "DecodeError",
    "ValidationError",
    "Map",
    "Value",
    "Option",
    "Some",
    "None",
    "Result",
    "Ok",
    "Err",
    "Vec",
    "String",
    "Box",
    "Default",
];

/// Inherent client methods an operation may not shadow.
const CLIENT_METHODS: &[&str] = &["new", "with_http_client", "endpoint"];

/// Validates a model and configuration before code generation.
///
/// ## Errors
///
/// Returns the first problem found, checking the configuration first, then
/// definitions, then operations.
pub fn validate_model(model: &ApiModel, config: &BuildConfig) -> Result<(), GeneratorError> {
    config.validate()?;
    validate_definitions(model)?;
    validate_operations(model)?;
    debug!(
        definitions = model.definitions.len(),
        operations = model.operations().count(),
        "model validated"
    );
    Ok(())
}

fn validate_definitions(model: &ApiModel) -> Result<(), GeneratorError> {
    let mut by_name: HashMap<&str, &Definition> = HashMap::new();
    let mut by_ident: HashMap<String, &Definition> = HashMap::new();

    for def in &model.definitions {
        if let Some(previous) = by_name.insert(&def.name, def) {
            return Err(definition_clash(previous, def));
        }

        let ident = type_ident(&def.name).to_string();
        if RESERVED_TYPE_NAMES.contains(&ident.as_str()) {
            return Err(GeneratorError::NamingCollision {
                context: "the DTO module".to_string(),
                first: def.name.clone(),
                second: format!("the imported type {ident}"),
                ident,
            });
        }
        if let Some(previous) = by_ident.insert(ident.clone(), def) {
            return Err(match definition_clash(previous, def) {
                GeneratorError::DuplicateDefinition { .. } => GeneratorError::NamingCollision {
                    context: "definition names".to_string(),
                    first: previous.name.clone(),
                    second: def.name.clone(),
                    ident,
                },
                other => other,
            });
        }

        validate_properties(def)?;
    }
    Ok(())
}

/// The error for two definitions competing for one name.
fn definition_clash(previous: &Definition, current: &Definition) -> GeneratorError {
    match (previous.synthetic, current.synthetic) {
        (false, true) => GeneratorError::SyntheticCollision {
            name: current.name.clone(),
            explicit: previous.name.clone(),
        },
        (true, false) => GeneratorError::SyntheticCollision {
            name: previous.name.clone(),
            explicit: current.name.clone(),
        },
        _ => GeneratorError::DuplicateDefinition {
            name: current.name.clone(),
        },
    }
}

fn validate_properties(def: &Definition) -> Result<(), GeneratorError> {
    let mut names = HashSet::new();
    let mut idents: HashMap<String, &str> = HashMap::new();
    for property in &def.properties {
        if !names.insert(property.name.as_str()) {
            return Err(GeneratorError::DuplicateProperty {
                definition: def.name.clone(),
                property: property.name.clone(),
            });
        }
        let ident = field_ident(&property.name).to_string();
        if let Some(first) = idents.insert(ident.clone(), &property.name) {
            return Err(GeneratorError::NamingCollision {
                context: format!("fields of '{}'", def.name),
                first: first.to_string(),
                second: property.name.clone(),
                ident,
            });
        }
    }
    Ok(())
}

fn validate_operations(model: &ApiModel) -> Result<(), GeneratorError> {
    let mut seen: HashMap<OperationKey, &PathMethodModel> = HashMap::new();
    // Client method name -> the operation that claimed it.
    let mut methods: BTreeMap<String, OperationKey> = BTreeMap::new();
    // Route shape -> the first template mounted on it.
    let mut routes: HashMap<String, &str> = HashMap::new();

    for op in model.operations() {
        let key = op.key();
        if let Some(previous) = seen.get(&key) {
            if *previous != op {
                return Err(GeneratorError::DuplicateOperation {
                    key: key.to_string(),
                });
            }
            continue;
        }
        seen.insert(key.clone(), op);

        let shape = route_shape(&op.path);
        match routes.get(shape.as_str()) {
            Some(first) if *first != op.path => {
                return Err(GeneratorError::NamingCollision {
                    context: "route templates".to_string(),
                    first: first.to_string(),
                    second: op.path.clone(),
                    ident: shape,
                });
            }
            Some(_) => {}
            None => {
                routes.insert(shape, &op.path);
            }
        }

        let name = operation_name(op);
        for method in [name.clone(), format!("{name}_async")] {
            if CLIENT_METHODS.contains(&method.as_str()) {
                return Err(GeneratorError::NamingCollision {
                    context: "client methods".to_string(),
                    first: key.to_string(),
                    second: format!("the built-in method {method}"),
                    ident: method,
                });
            }
            if let Some(first) = methods.insert(method.clone(), key.clone()) {
                return Err(GeneratorError::NamingCollision {
                    context: "operation names".to_string(),
                    first: first.to_string(),
                    second: key.to_string(),
                    ident: method,
                });
            }
        }

        validate_parameters(op)?;
        validate_path_parameters(op)?;
        validate_body_sources(op)?;
    }
    Ok(())
}

fn validate_parameters(op: &PathMethodModel) -> Result<(), GeneratorError> {
    let mut bindings: HashMap<String, &str> = HashMap::new();
    for param in &op.parameters {
        let binding = binding_name(&param.name);
        if let Some(first) = bindings.insert(binding.clone(), &param.name) {
            return Err(GeneratorError::NamingCollision {
                context: format!("parameters of '{}'", op.key()),
                first: first.to_string(),
                second: param.name.clone(),
                ident: binding,
            });
        }
    }
    Ok(())
}

fn validate_path_parameters(op: &PathMethodModel) -> Result<(), GeneratorError> {
    let placeholders = extract_path_params(&op.path);
    for name in &placeholders {
        if !op.path_parameters().any(|p| p.name == *name) {
            return Err(GeneratorError::MissingPathParameter {
                operation: op.key().to_string(),
                name: name.to_string(),
                reason: "appears in the template but is not declared".to_string(),
            });
        }
    }
    for param in op.path_parameters() {
        if !placeholders.contains(&param.name.as_str()) {
            return Err(GeneratorError::MissingPathParameter {
                operation: op.key().to_string(),
                name: param.name.clone(),
                reason: "is declared but missing from the template".to_string(),
            });
        }
        if !param.required {
            return Err(GeneratorError::MissingPathParameter {
                operation: op.key().to_string(),
                name: param.name.clone(),
                reason: "must be required".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_body_sources(op: &PathMethodModel) -> Result<(), GeneratorError> {
    let body_params = op.parameters_in(Location::Body).count();
    let form_params = op.parameters_in(Location::Form).count();
    let reason = match (op.request_body.is_some(), body_params > 0, form_params > 0) {
        (true, true, _) => "a request body and body parameters",
        (true, _, true) => "a request body and form parameters",
        (false, true, true) => "body parameters and form parameters",
        _ => return Ok(()),
    };
    Err(GeneratorError::ConflictingBodies {
        operation: op.key().to_string(),
        reason: reason.to_string(),
    })
}
