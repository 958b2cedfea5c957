//! Tree-composition errors.
//!
//! These indicate a programming error in module composition, not bad user
//! input, so they surface as `Err` values at merge time instead of being
//! routed through the not-found channel.

/// An error produced while grafting a module onto a running route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSetupError {
    /// The anchor key does not resolve to a node of the current tree.
    AnchorNotFound { key: String },
    /// A sibling of the anchor already exposes the same non-wildcard path as
    /// one of the incoming tree's top-level children.
    PathClash { key: String, path: String },
    /// A child slot of the anchor with a non-wildcard path has the same name
    /// as one of the incoming tree's child slots.
    SlotClash { key: String, name: String },
}

impl std::fmt::Display for NavigationSetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnchorNotFound { key } => write!(
                f,
                "cannot update the navigation tree at route with key \"{key}\": the key \
                 doesn't exist"
            ),
            Self::PathClash { key, path } => write!(
                f,
                "error while merging modular route with key \"{key}\": path \"{path}\" is \
                 already defined in the parent; only wildcard paths can be replaced"
            ),
            Self::SlotClash { key, name } => write!(
                f,
                "error while merging modular route with key \"{key}\": child \"{name}\" is \
                 already defined in the parent with a non-wildcard path"
            ),
        }
    }
}

impl std::error::Error for NavigationSetupError {}
