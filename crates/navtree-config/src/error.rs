//! Configuration-time errors.
//!
//! Every violation aborts parsing immediately; there is no partial tree and
//! no recovery. These are build-time concerns surfaced to a developer.

/// An error produced while parsing the navigation DSL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not a nested mapping of routes and parameters.
    InvalidDocument,
    /// A parameter declaration's value is not a string.
    NonStringParamValue { key: String },
    /// A parameter declaration does not match `modifier? name: kind (hint)?`.
    InvalidParamDeclaration { key: String, value: String },
    /// A modifier other than `propagate` was used.
    UnknownModifier { modifier: String, name: String },
    /// A parameter name does not match `^[A-Za-z_]\w*$`.
    InvalidParamName { name: String },
    /// A `{name}` path variable does not match `^[A-Za-z_]\w*$`.
    InvalidPathVarName { name: String },
    /// A parameter declared a value kind outside the fixed set.
    UnknownValueKind { kind: String, name: String },
    /// A route path does not start with `/`.
    InvalidPath { path: String },
    /// A route line does not match `+ name (path)`.
    InvalidRouteLine { key: String },
    /// Two routes resolve to the same local key.
    DuplicateRouteKey { key: String },
    /// A query parameter collides with an ancestor path parameter.
    QueryClashWithPathParam { name: String, key: String },
    /// A query parameter collides with a propagated ancestor query parameter.
    QueryClashWithPropagatedParam { name: String, key: String },
    /// Module-link syntax (`~`) used below the document root.
    ModuleLinkBelowRoot,
    /// The document does not contain exactly one top-level route.
    MissingSingleRoot,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDocument => write!(
                f,
                "the document is not formatted correctly: all parameter values must be \
                 strings and all routes must start with \"+ \""
            ),
            Self::NonStringParamValue { key } => write!(
                f,
                "error while parsing key \"{key}\": parameter values must be strings"
            ),
            Self::InvalidParamDeclaration { key, value } => write!(
                f,
                "incorrect parameter format: \"{key}: {value}\". Expected format is \
                 \"modifier name: kind (typeHint)\", where modifier and typeHint are optional"
            ),
            Self::UnknownModifier { modifier, name } => write!(
                f,
                "invalid modifier \"{modifier}\" for parameter \"{name}\". Valid options \
                 are: \"propagate\""
            ),
            Self::InvalidParamName { name } => write!(
                f,
                "invalid parameter name: {name}. Use only letters, numbers and _, and do \
                 not start with a number"
            ),
            Self::InvalidPathVarName { name } => write!(
                f,
                "invalid route parameter: {name}. Use only letters, numbers and _, and do \
                 not start with a number"
            ),
            Self::UnknownValueKind { kind, name } => write!(
                f,
                "invalid type \"{kind}\" for parameter \"{name}\". Valid options are: \
                 string, number, boolean, string[], number[], boolean[], object"
            ),
            Self::InvalidPath { path } => {
                write!(f, "invalid path: {path}. Paths must start with \"/\"")
            }
            Self::InvalidRouteLine { key } => {
                write!(f, "invalid route key: {key}. Expected format: + name (path)")
            }
            Self::DuplicateRouteKey { key } => write!(f, "duplicated route: \"{key}\""),
            Self::QueryClashWithPathParam { name, key } => write!(
                f,
                "parameter \"{name}\" of route \"{key}\" has already been defined as a \
                 route parameter for a parent route"
            ),
            Self::QueryClashWithPropagatedParam { name, key } => write!(
                f,
                "parameter \"{name}\" of route \"{key}\" has already been defined as a \
                 propagated query parameter for a parent route"
            ),
            Self::ModuleLinkBelowRoot => write!(
                f,
                "invalid route module: route links (~) can only appear at the root level"
            ),
            Self::MissingSingleRoot => {
                write!(f, "invalid format: expected a single route at the root level")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
