//! Schema definitions: named object types and the type references that
//! point at them.
//!
//! [`TypeRef`] is a closed tagged union. Consumers match on it instead of
//! inspecting type names, so list-ness and reference-ness are structural.

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Abstract scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// UTF-8 text.
    String,
    /// Date, carried as text.
    Date,
    /// No value.
    Unit,
}

/// A reference to an abstract type, optionally carrying a rule.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{Primitive, TypeRef};
///
/// let users = TypeRef::list_of(TypeRef::reference("User"));
/// assert!(users.is_list());
/// assert_eq!(users.element().referenced_name(), Some("User"));
///
/// let json = r#"{"kind":"primitive","primitive":"string"}"#;
/// let ty: TypeRef = serde_json::from_str(json).unwrap();
/// assert_eq!(ty, TypeRef::primitive(Primitive::String));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// A scalar.
    Primitive {
        primitive: Primitive,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rule: Option<Rule>,
    },
    /// A homogeneous list.
    List {
        items: Box<TypeRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rule: Option<Rule>,
    },
    /// A named [`Definition`].
    Reference {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rule: Option<Rule>,
    },
}

impl TypeRef {
    /// A primitive with no rule.
    pub fn primitive(primitive: Primitive) -> Self {
        TypeRef::Primitive {
            primitive,
            rule: None,
        }
    }

    /// `bool`
    pub fn bool() -> Self {
        Self::primitive(Primitive::Bool)
    }

    /// `int`
    pub fn int() -> Self {
        Self::primitive(Primitive::Int)
    }

    /// `float`
    pub fn float() -> Self {
        Self::primitive(Primitive::Float)
    }

    /// `string`
    pub fn string() -> Self {
        Self::primitive(Primitive::String)
    }

    /// `date`
    pub fn date() -> Self {
        Self::primitive(Primitive::Date)
    }

    /// `unit`
    pub fn unit() -> Self {
        Self::primitive(Primitive::Unit)
    }

    /// A list of `items` with no rule.
    pub fn list_of(items: TypeRef) -> Self {
        TypeRef::List {
            items: Box::new(items),
            rule: None,
        }
    }

    /// A reference to the named definition with no rule.
    pub fn reference(name: impl Into<String>) -> Self {
        TypeRef::Reference {
            name: name.into(),
            rule: None,
        }
    }

    /// Returns this type with `rule` attached, replacing any existing rule.
    pub fn with_rule(mut self, new_rule: Rule) -> Self {
        match &mut self {
            TypeRef::Primitive { rule, .. }
            | TypeRef::List { rule, .. }
            | TypeRef::Reference { rule, .. } => *rule = Some(new_rule),
        }
        self
    }

    /// The rule carried on this type, if any.
    pub fn rule(&self) -> Option<&Rule> {
        match self {
            TypeRef::Primitive { rule, .. }
            | TypeRef::List { rule, .. }
            | TypeRef::Reference { rule, .. } => rule.as_ref(),
        }
    }

    /// The rule carried on a list's element type.
    pub fn element_rule(&self) -> Option<&Rule> {
        match self {
            TypeRef::List { items, .. } => items.rule(),
            _ => None,
        }
    }

    /// `true` for lists.
    pub fn is_list(&self) -> bool {
        matches!(self, TypeRef::List { .. })
    }

    /// The element type for lists, `self` otherwise.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::List { items, .. } => items,
            other => other,
        }
    }

    /// The referenced definition name, if this is a reference.
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            TypeRef::Reference { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Short human-readable rendering used in diagnostics (e.g. `list<User>`).
    pub fn describe(&self) -> String {
        match self {
            TypeRef::Primitive { primitive, .. } => match primitive {
                Primitive::Bool => "bool".to_string(),
                Primitive::Int => "int".to_string(),
                Primitive::Float => "float".to_string(),
                Primitive::String => "string".to_string(),
                Primitive::Date => "date".to_string(),
                Primitive::Unit => "unit".to_string(),
            },
            TypeRef::List { items, .. } => format!("list<{}>", items.describe()),
            TypeRef::Reference { name, .. } => name.clone(),
        }
    }
}

/// A field of a [`Definition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Wire key. The generated field name is derived from it.
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Required fields must be present on the wire.
    #[serde(default)]
    pub required: bool,
    /// Rule attached to the property itself.
    #[serde(default)]
    pub rule: Option<Rule>,
    /// Default value used by servers when binding absent parameters.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Field documentation.
    #[serde(default)]
    pub description: Option<String>,
}

impl Property {
    /// A required property.
    pub fn required(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            rule: None,
            default: None,
            description: None,
        }
    }

    /// An optional property.
    pub fn optional(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    /// Attaches a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The attached rule combined with the rule carried on the type.
    pub fn effective_rule(&self) -> Option<Rule> {
        Rule::combine(self.rule.as_ref(), self.ty.rule())
    }

    /// Rule every element of a list value must satisfy.
    pub fn element_rule(&self) -> Option<Rule> {
        self.ty.element_rule().cloned()
    }
}

/// A named object type.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{Definition, Property, Rule, TypeRef};
///
/// let user = Definition::new("User")
///     .with_property(Property::required("id", TypeRef::int()))
///     .with_property(Property::optional("name", TypeRef::string()).with_rule(Rule::NonEmpty));
///
/// assert!(user.has_rules());
/// assert_eq!(user.property("name").map(|p| p.required), Some(false));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Unique name.
    pub name: String,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Inferred from an inline schema rather than declared by name.
    #[serde(default)]
    pub synthetic: bool,
    /// Type documentation.
    #[serde(default)]
    pub description: Option<String>,
}

impl Definition {
    /// A declared definition with no properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            synthetic: false,
            description: None,
        }
    }

    /// Marks the definition as synthetic.
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// Appends a property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Looks up a property by wire name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// `true` if any property has an effective rule.
    pub fn has_rules(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.effective_rule().is_some() || p.element_rule().is_some())
    }
}
