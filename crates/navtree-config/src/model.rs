//! The static route-tree model produced by the parser.

use crate::param::{ParamKind, Parameter, PathSegment};
use serde::Serialize;
use std::collections::BTreeMap;

/// One node of the parsed navigation tree.
///
/// The path is full (root-relative): every ancestor's own segments followed
/// by this node's own, in order. The query list contains inherited propagated
/// parameters first (ancestor order), then the node's own non-path
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteNode {
    /// Last component of the key.
    pub name: String,
    /// Dotted path of ancestor names relative to the parsing root, unique
    /// across the tree.
    pub local_key: String,
    /// Like `local_key`, but rooted at the linked namespace when the tree is
    /// a module. Equal to `local_key` otherwise.
    pub global_key: String,
    /// Full (root-relative) path.
    pub path: Vec<PathSegment>,
    /// Effective query parameters.
    pub query: Vec<Parameter>,
    /// Child routes, in declaration order.
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// The path as a template string, e.g. `/studios/{studioId}/stacks`.
    #[must_use]
    pub fn path_template(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            out.push('/');
            out.push_str(&segment.as_template());
        }
        out
    }

    /// Path and query parameters merged into one kind map.
    #[must_use]
    pub fn param_metadata(&self) -> BTreeMap<String, ParamKind> {
        let mut metadata = BTreeMap::new();
        for segment in &self.path {
            if let Some(p) = segment.param() {
                metadata.insert(p.name.clone(), p.kind);
            }
        }
        for p in &self.query {
            metadata.insert(p.name.clone(), p.kind);
        }
        metadata
    }

    /// Depth-first iteration over this node and all descendants.
    pub fn walk(&self, visit: &mut impl FnMut(&RouteNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A parsed navigation document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// The single root route.
    pub root: RouteNode,
    /// True when the root carries a module-link declaration (`~`), i.e. the
    /// tree is meant to be grafted onto a host tree at runtime.
    pub is_module: bool,
}
