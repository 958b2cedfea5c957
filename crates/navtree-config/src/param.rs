//! Parameter value kinds and path segments.

use serde::Serialize;

/// The declared value kind of a route or query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamKind {
    /// Plain string (the default for implicit path variables).
    String,
    /// Floating-point number.
    Number,
    /// Boolean.
    Boolean,
    /// Array of strings.
    StringArray,
    /// Array of numbers.
    NumberArray,
    /// Array of booleans.
    BooleanArray,
    /// Opaque object, carried as JSON.
    Object,
}

impl ParamKind {
    /// Parse a kind from its DSL spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "string[]" => Some(Self::StringArray),
            "number[]" => Some(Self::NumberArray),
            "boolean[]" => Some(Self::BooleanArray),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// The DSL spelling of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::StringArray => "string[]",
            Self::NumberArray => "number[]",
            Self::BooleanArray => "boolean[]",
            Self::Object => "object",
        }
    }

    /// Whether this kind is an array kind.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Self::StringArray | Self::NumberArray | Self::BooleanArray
        )
    }

    /// The element kind of an array kind; scalar kinds return themselves.
    #[must_use]
    pub fn element_kind(&self) -> Self {
        match self {
            Self::StringArray => Self::String,
            Self::NumberArray => Self::Number,
            Self::BooleanArray => Self::Boolean,
            other => *other,
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared route or query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Identifier, unique within its owning scope.
    pub name: String,
    /// Declared value kind.
    pub kind: ParamKind,
    /// Optional language-specific type annotation, meaningful only to a code
    /// generator.
    pub type_hint: Option<String>,
    /// Query parameters only: a propagated parameter is visible to every
    /// descendant route.
    pub propagate: bool,
}

impl Parameter {
    /// An implicit `string` parameter for a path variable that was not
    /// declared explicitly.
    #[must_use]
    pub fn implicit(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::String,
            type_hint: None,
            propagate: false,
        }
    }
}

/// One segment of a route path: a literal or a bound parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PathSegment {
    /// A literal segment (contains no `/`). The literal `*` as a final
    /// segment marks a wildcard route.
    Literal(String),
    /// A `{name}` placeholder bound to a parameter.
    Param(Parameter),
}

impl PathSegment {
    /// The parameter bound by this segment, if any.
    #[must_use]
    pub fn param(&self) -> Option<&Parameter> {
        match self {
            Self::Literal(_) => None,
            Self::Param(p) => Some(p),
        }
    }

    /// Render the segment as it appears in a path template.
    #[must_use]
    pub fn as_template(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Param(p) => format!("{{{}}}", p.name),
        }
    }
}

/// Validates an identifier against `^[A-Za-z_]\w*$`.
#[must_use]
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Word characters only (`\w+`).
#[must_use]
pub(crate) fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
