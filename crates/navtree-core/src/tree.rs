//! The live route tree.
//!
//! Nodes live in an arena (`Vec`) addressed by [`RouteId`], so subtree
//! replacement during a module graft is a handful of index rewrites instead
//! of pointer surgery. Nodes detached by a graft stay in the arena as
//! unreachable entries; their ids remain valid but no longer resolve from
//! the root.

use crate::error::NavigationSetupError;
use crate::urlenc::split_path;
use navtree_config::{Config, ParamKind, RouteNode};
use std::collections::BTreeMap;

/// Identifies one node of a [`RouteTree`]. Only meaningful for the tree that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(usize);

/// How a path relates to a route. See [`RouteTree::match_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    /// The path and the route are unrelated.
    NoMatch,
    /// The path corresponds to this route. Wildcard routes report `Exact`
    /// for any deeper path once their prefix matches.
    Exact,
    /// The path corresponds to a descendant of this route.
    Subroute,
    /// The path corresponds to an ancestor of this route.
    SuperRoute,
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    path: String,
    parent: Option<RouteId>,
    children: Vec<(String, RouteId)>,
    params: BTreeMap<String, ParamKind>,
}

/// The matchable navigation tree.
#[derive(Debug)]
pub struct RouteTree {
    nodes: Vec<Node>,
    root: RouteId,
}

impl RouteTree {
    /// Create a tree with a single root node.
    ///
    /// `path` is the full template, with `{name}` placeholders and, for
    /// wildcard routes, a final `/*` segment.
    #[must_use]
    pub fn new(key: &str, path: &str, params: BTreeMap<String, ParamKind>) -> Self {
        Self {
            nodes: vec![Node {
                key: key.to_string(),
                path: path.to_string(),
                parent: None,
                children: Vec::new(),
                params,
            }],
            root: RouteId(0),
        }
    }

    /// Add a child slot under `parent`. `name` is the slot name (the last
    /// component of the child's key); `path` is the child's full template.
    pub fn add_child(
        &mut self,
        parent: RouteId,
        name: &str,
        key: &str,
        path: &str,
        params: BTreeMap<String, ParamKind>,
    ) -> RouteId {
        let id = RouteId(self.nodes.len());
        self.nodes.push(Node {
            key: key.to_string(),
            path: path.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            params,
        });
        self.nodes[parent.0].children.push((name.to_string(), id));
        id
    }

    /// Instantiate the live tree from a parsed configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let root = &config.root;
        let mut tree = Self::new(
            &root.global_key,
            &root.path_template(),
            root.param_metadata(),
        );
        for child in &root.children {
            tree.add_config_subtree(tree.root, child);
        }
        tree
    }

    fn add_config_subtree(&mut self, parent: RouteId, node: &RouteNode) {
        let id = self.add_child(
            parent,
            &node.name,
            &node.global_key,
            &node.path_template(),
            node.param_metadata(),
        );
        for child in &node.children {
            self.add_config_subtree(id, child);
        }
    }

    // ==== ACCESSORS ====

    #[must_use]
    pub fn root(&self) -> RouteId {
        self.root
    }

    #[must_use]
    pub fn key(&self, id: RouteId) -> &str {
        &self.nodes[id.0].key
    }

    #[must_use]
    pub fn path(&self, id: RouteId) -> &str {
        &self.nodes[id.0].path
    }

    #[must_use]
    pub fn parent(&self, id: RouteId) -> Option<RouteId> {
        self.nodes[id.0].parent
    }

    /// Path and query parameter kinds, merged.
    #[must_use]
    pub fn params(&self, id: RouteId) -> &BTreeMap<String, ParamKind> {
        &self.nodes[id.0].params
    }

    /// Child slots in declaration order.
    pub fn children(&self, id: RouteId) -> impl Iterator<Item = (&str, RouteId)> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .map(|(name, child)| (name.as_str(), *child))
    }

    #[must_use]
    pub fn child(&self, id: RouteId, name: &str) -> Option<RouteId> {
        self.nodes[id.0]
            .children
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, child)| *child)
    }

    #[must_use]
    pub fn is_wildcard(&self, id: RouteId) -> bool {
        self.nodes[id.0].path.ends_with("/*")
    }

    // ==== KEY HELPERS ====

    /// Whether this node's key equals `key`.
    #[must_use]
    pub fn is(&self, id: RouteId, key: &str) -> bool {
        self.nodes[id.0].key == key
    }

    /// Whether `key` names this node or one of its subroutes. Checks the key
    /// format only; the named route need not exist.
    #[must_use]
    pub fn contains_subroute(&self, id: RouteId, key: &str) -> bool {
        key_is_subroute_of(key, &self.nodes[id.0].key)
    }

    /// Whether this node is `key` itself or one of its subroutes.
    #[must_use]
    pub fn is_subroute_of(&self, id: RouteId, key: &str) -> bool {
        key_is_subroute_of(&self.nodes[id.0].key, key)
    }

    /// The chain from the root to this node, root first.
    #[must_use]
    pub fn branch(&self, id: RouteId) -> Vec<RouteId> {
        let mut chain = vec![id];
        while let Some(parent) = self.nodes[chain[chain.len() - 1].0].parent {
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// Resolve a dotted key to a node by walking child slots from the root.
    /// An optional leading `{root key}.` prefix is stripped first.
    #[must_use]
    pub fn resolve_key(&self, key: &str) -> Option<RouteId> {
        let root_key = self.nodes[self.root.0].key.as_str();
        let rest = if key == root_key {
            ""
        } else {
            key.strip_prefix(root_key)
                .and_then(|r| r.strip_prefix('.'))
                .unwrap_or(key)
        };
        let mut current = self.root;
        if !rest.is_empty() {
            for part in rest.split('.') {
                current = self.child(current, part)?;
            }
        }
        Some(current)
    }

    // ==== MATCHING ====

    /// Relate an evaluated URL path to this route, segment by segment.
    ///
    /// The route's wildcard suffix is stripped before splitting; `{name}`
    /// segments match anything.
    #[must_use]
    pub fn match_path(&self, id: RouteId, path: &str) -> PathMatch {
        let node = &self.nodes[id.0];
        let wildcard = node.path.ends_with("/*");
        let template = node.path.strip_suffix("/*").unwrap_or(&node.path);
        let route_parts = split_path(template);
        let url_parts = split_path(path);
        let min = route_parts.len().min(url_parts.len());
        for i in 0..min {
            if placeholder_name(route_parts[i]).is_none() && route_parts[i] != url_parts[i] {
                return PathMatch::NoMatch;
            }
        }
        if !wildcard && route_parts.len() < url_parts.len() {
            return PathMatch::Subroute;
        }
        if route_parts.len() > url_parts.len() {
            return PathMatch::SuperRoute;
        }
        PathMatch::Exact
    }

    /// Find the node corresponding to an evaluated URL path.
    ///
    /// Wildcard routes act as catch-all boundaries: they win over an
    /// unmatched deeper path but still yield to a more specific descendant
    /// match when one exists. Returns `None` when nothing in the tree relates
    /// to the path (the not-found case).
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<RouteId> {
        self.find_from(self.root, path, None)
    }

    fn find_from(&self, id: RouteId, path: &str, last: Option<RouteId>) -> Option<RouteId> {
        match self.match_path(id, path) {
            PathMatch::Exact => {
                if self.is_wildcard(id) {
                    self.child_ids(id)
                        .find_map(|child| self.find_from(child, path, Some(id)))
                        .or(Some(id))
                } else {
                    Some(id)
                }
            }
            PathMatch::Subroute => {
                let next = if self.is_wildcard(id) { last } else { Some(id) };
                let found = self
                    .child_ids(id)
                    .find_map(|child| self.find_from(child, path, next));
                if found.is_some() {
                    found
                } else if self.is_wildcard(id) {
                    Some(id)
                } else {
                    last
                }
            }
            PathMatch::NoMatch | PathMatch::SuperRoute => None,
        }
    }

    fn child_ids(&self, id: RouteId) -> impl Iterator<Item = RouteId> + '_ {
        self.nodes[id.0].children.iter().map(|(_, child)| *child)
    }

    // ==== MODULE GRAFTING ====

    /// Graft a module tree at the node named by `anchor_key`, replacing it.
    ///
    /// Collisions are validated before any link is rewritten, so a failed
    /// graft leaves the tree exactly as it was. After the swap, children of
    /// the old anchor missing under the new node are carried over; when both
    /// sides define a slot and the new one is a wildcard, the carry-over
    /// recurses into it, so wildcard extension points accumulate children
    /// across successive grafts.
    pub fn graft(
        &mut self,
        module: RouteTree,
        anchor_key: &str,
    ) -> Result<RouteId, NavigationSetupError> {
        let anchor = self
            .resolve_key(anchor_key)
            .ok_or_else(|| NavigationSetupError::AnchorNotFound {
                key: anchor_key.to_string(),
            })?;
        let offset = self.nodes.len();
        let incoming = RouteId(module.root.0 + offset);
        for mut node in module.nodes {
            node.parent = node.parent.map(|p| RouteId(p.0 + offset));
            for (_, child) in &mut node.children {
                *child = RouteId(child.0 + offset);
            }
            self.nodes.push(node);
        }

        if let Err(err) = self.validate_graft(anchor, incoming, anchor_key) {
            self.nodes.truncate(offset);
            return Err(err);
        }

        let anchor_parent = self.nodes[anchor.0].parent;
        self.nodes[incoming.0].parent = anchor_parent;
        match anchor_parent {
            None => self.root = incoming,
            Some(parent) => {
                for slot in &mut self.nodes[parent.0].children {
                    if slot.1 == anchor {
                        slot.1 = incoming;
                    }
                }
            }
        }
        self.carry_over_children(anchor, incoming);
        Ok(incoming)
    }

    fn validate_graft(
        &self,
        anchor: RouteId,
        incoming: RouteId,
        anchor_key: &str,
    ) -> Result<(), NavigationSetupError> {
        let old_paths: Vec<&str> = self
            .child_ids(anchor)
            .filter(|child| !self.is_wildcard(*child))
            .map(|child| self.path(child))
            .collect();
        for (name, child) in &self.nodes[incoming.0].children {
            let path = self.nodes[child.0].path.as_str();
            if old_paths.contains(&path) {
                return Err(NavigationSetupError::PathClash {
                    key: anchor_key.to_string(),
                    path: path.to_string(),
                });
            }
            if let Some(existing) = self.child(anchor, name) {
                if !self.is_wildcard(existing) {
                    return Err(NavigationSetupError::SlotClash {
                        key: anchor_key.to_string(),
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn carry_over_children(&mut self, old: RouteId, new: RouteId) {
        let old_children = self.nodes[old.0].children.clone();
        for (name, old_child) in old_children {
            match self.child(new, &name) {
                None => {
                    self.nodes[old_child.0].parent = Some(new);
                    self.nodes[new.0].children.push((name, old_child));
                }
                Some(new_child) if self.is_wildcard(new_child) => {
                    self.carry_over_children(old_child, new_child);
                }
                Some(_) => {}
            }
        }
    }
}

/// Whether the segment is a `{name}` placeholder, and for which name.
pub(crate) fn placeholder_name(segment: &str) -> Option<&str> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(inner)
}

/// Whether `key` equals `ancestor` or names one of its subroutes. A format
/// check only; neither key needs to exist in any tree.
#[must_use]
pub fn key_is_subroute_of(key: &str, ancestor: &str) -> bool {
    key == ancestor
        || (key.len() > ancestor.len()
            && key.starts_with(ancestor)
            && key.as_bytes()[ancestor.len()] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_params() -> BTreeMap<String, ParamKind> {
        BTreeMap::new()
    }

    fn string_params(names: &[&str]) -> BTreeMap<String, ParamKind> {
        names
            .iter()
            .map(|n| ((*n).to_string(), ParamKind::String))
            .collect()
    }

    /// The reference tree used across the matching tests:
    /// studios with nested stacks/starters, a wildcard account route, and a
    /// chain of nested wildcard workspace routes.
    fn fixture() -> RouteTree {
        let mut t = RouteTree::new("root", "/", no_params());
        let root = t.root();
        let studios = t.add_child(root, "studios", "root.studios", "/studios", no_params());
        let studio = t.add_child(
            studios,
            "studio",
            "root.studios.studio",
            "/studios/{studioId}",
            string_params(&["studioId"]),
        );
        let stacks = t.add_child(
            studio,
            "stacks",
            "root.studios.studio.stacks",
            "/studios/{studioId}/stacks",
            string_params(&["studioId"]),
        );
        t.add_child(
            stacks,
            "stack",
            "root.studios.studio.stacks.stack",
            "/studios/{studioId}/stacks/{stackId}",
            string_params(&["studioId", "stackId"]),
        );
        t.add_child(root, "account", "root.account", "/account/*", no_params());
        let workspaces = t.add_child(
            root,
            "workspaces",
            "root.workspaces",
            "/workspaces/*",
            no_params(),
        );
        let workspace = t.add_child(
            workspaces,
            "workspace",
            "root.workspaces.workspace",
            "/workspaces/{workspaceId}/*",
            string_params(&["workspaceId"]),
        );
        t.add_child(
            workspace,
            "stacks",
            "root.workspaces.workspace.stacks",
            "/workspaces/{workspaceId}/stacks/*",
            string_params(&["workspaceId"]),
        );
        t
    }

    fn find_key<'a>(t: &'a RouteTree, path: &str) -> Option<&'a str> {
        t.find_by_path(path).map(|id| t.key(id))
    }

    #[test]
    fn match_relations() {
        let t = fixture();
        let studios = t.resolve_key("root.studios").unwrap();
        assert_eq!(t.match_path(studios, "studios"), PathMatch::Exact);
        assert_eq!(t.match_path(studios, "studios/s1"), PathMatch::Subroute);
        assert_eq!(t.match_path(studios, ""), PathMatch::SuperRoute);
        assert_eq!(t.match_path(studios, "account"), PathMatch::NoMatch);
    }

    #[test]
    fn placeholders_match_any_segment() {
        let t = fixture();
        let stack = t.resolve_key("root.studios.studio.stacks.stack").unwrap();
        assert_eq!(t.match_path(stack, "studios/s1/stacks/k1"), PathMatch::Exact);
        assert_eq!(t.match_path(stack, "studios/s1/stacks"), PathMatch::SuperRoute);
        assert_eq!(
            t.match_path(stack, "studios/s1/plugins/k1"),
            PathMatch::NoMatch
        );
    }

    #[test]
    fn wildcard_reports_exact_for_deeper_paths() {
        let t = fixture();
        let account = t.resolve_key("root.account").unwrap();
        assert_eq!(t.match_path(account, "account"), PathMatch::Exact);
        assert_eq!(t.match_path(account, "account/settings/x"), PathMatch::Exact);
        assert_eq!(t.match_path(account, ""), PathMatch::SuperRoute);
        assert_eq!(t.match_path(account, "studios"), PathMatch::NoMatch);
    }

    #[test]
    fn resolution_prefers_exact_nodes() {
        let t = fixture();
        assert_eq!(find_key(&t, ""), Some("root"));
        assert_eq!(find_key(&t, "studios"), Some("root.studios"));
        assert_eq!(
            find_key(&t, "studios/s1/stacks/k1"),
            Some("root.studios.studio.stacks.stack")
        );
    }

    #[test]
    fn resolution_fails_for_unrelated_paths() {
        let t = fixture();
        assert_eq!(t.find_by_path("inexistent"), None);
    }

    #[test]
    fn deep_wildcard_wins_over_shallow() {
        let t = fixture();
        assert_eq!(find_key(&t, "workspaces"), Some("root.workspaces"));
        assert_eq!(
            find_key(&t, "workspaces/a"),
            Some("root.workspaces.workspace")
        );
        assert_eq!(
            find_key(&t, "workspaces/a/anything"),
            Some("root.workspaces.workspace")
        );
        assert_eq!(
            find_key(&t, "workspaces/a/stacks/b"),
            Some("root.workspaces.workspace.stacks")
        );
    }

    #[test]
    fn wildcard_catches_unknown_subpaths() {
        let t = fixture();
        assert_eq!(find_key(&t, "account/whatever/deep"), Some("root.account"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let t = fixture();
        let first = t.find_by_path("studios/s1/stacks/k1");
        for _ in 0..3 {
            assert_eq!(t.find_by_path("studios/s1/stacks/k1"), first);
        }
    }

    #[test]
    fn branch_is_root_first() {
        let t = fixture();
        let stack = t.resolve_key("root.studios.studio.stacks.stack").unwrap();
        let keys: Vec<&str> = t.branch(stack).into_iter().map(|id| t.key(id)).collect();
        assert_eq!(
            keys,
            vec![
                "root",
                "root.studios",
                "root.studios.studio",
                "root.studios.studio.stacks",
                "root.studios.studio.stacks.stack"
            ]
        );
    }

    #[test]
    fn key_helpers() {
        let t = fixture();
        let studios = t.resolve_key("root.studios").unwrap();
        assert!(t.is(studios, "root.studios"));
        assert!(t.contains_subroute(studios, "root.studios.studio"));
        assert!(!t.contains_subroute(studios, "root.studiosX"));
        assert!(t.is_subroute_of(studios, "root"));
        assert!(!t.is_subroute_of(studios, "root.account"));
        assert!(key_is_subroute_of("a.b", "a.b"));
        assert!(!key_is_subroute_of("a", "a.b"));
    }

    #[test]
    fn resolve_key_with_and_without_root_prefix() {
        let t = fixture();
        assert_eq!(t.resolve_key("root"), Some(t.root()));
        assert!(t.resolve_key("root.studios.studio").is_some());
        assert_eq!(
            t.resolve_key("studios.studio"),
            t.resolve_key("root.studios.studio")
        );
        assert_eq!(t.resolve_key("root.missing"), None);
    }

    #[test]
    fn from_config_builds_full_paths() {
        let config = navtree_config::ConfigParser::new(
            "+ root (/):\n  + studios (/studios):\n    + studio (/{studioId}):",
        )
        .parse()
        .unwrap();
        let t = RouteTree::from_config(&config);
        let studio = t.resolve_key("root.studios.studio").unwrap();
        assert_eq!(t.path(studio), "/studios/{studioId}");
        assert_eq!(
            t.params(studio).get("studioId"),
            Some(&ParamKind::String)
        );
        assert_eq!(find_key(&t, "studios/s1"), Some("root.studios.studio"));
    }

    #[test]
    fn graft_into_a_branch() {
        let mut t = fixture();
        let mut module = RouteTree::new("root.account", "/account", no_params());
        module.add_child(
            module.root(),
            "settings",
            "root.account.settings",
            "/account/settings",
            no_params(),
        );
        t.graft(module, "root.account").unwrap();
        assert_eq!(find_key(&t, "account/settings"), Some("root.account.settings"));
        assert_eq!(find_key(&t, "account"), Some("root.account"));
        // untouched siblings remain reachable
        assert_eq!(find_key(&t, "studios"), Some("root.studios"));
    }

    #[test]
    fn graft_into_the_root_carries_old_children_over() {
        let mut t = fixture();
        let mut module = RouteTree::new("root", "/", no_params());
        module.add_child(module.root(), "plugins", "root.plugins", "/plugins", no_params());
        t.graft(module, "root").unwrap();
        assert_eq!(find_key(&t, "plugins"), Some("root.plugins"));
        assert_eq!(find_key(&t, "studios"), Some("root.studios"));
        assert_eq!(find_key(&t, "account/x"), Some("root.account"));
        let studios = t.resolve_key("root.studios").unwrap();
        assert_eq!(t.parent(studios), Some(t.root()));
    }

    #[test]
    fn graft_fails_for_missing_anchor() {
        let mut t = fixture();
        let module = RouteTree::new("root.missing", "/missing", no_params());
        let err = t.graft(module, "root.missing").unwrap_err();
        assert_eq!(
            err,
            NavigationSetupError::AnchorNotFound {
                key: "root.missing".into()
            }
        );
    }

    #[test]
    fn graft_fails_on_path_clash_and_leaves_tree_intact() {
        let mut t = fixture();
        let mut module = RouteTree::new("root", "/", no_params());
        module.add_child(module.root(), "foo", "root.foo", "/studios", no_params());
        let err = t.graft(module, "root").unwrap_err();
        assert_eq!(
            err,
            NavigationSetupError::PathClash {
                key: "root".into(),
                path: "/studios".into()
            }
        );
        assert_eq!(find_key(&t, "studios"), Some("root.studios"));
    }

    #[test]
    fn graft_fails_on_slot_clash() {
        let mut t = fixture();
        let mut module = RouteTree::new("root", "/", no_params());
        module.add_child(module.root(), "studios", "root.studios", "/foo", no_params());
        let err = t.graft(module, "root").unwrap_err();
        assert_eq!(
            err,
            NavigationSetupError::SlotClash {
                key: "root".into(),
                name: "studios".into()
            }
        );
    }

    #[test]
    fn wildcard_slots_accumulate_children_across_grafts() {
        let mut t = fixture();
        // same wildcard slot, new child underneath: the graft must merge
        // into the wildcard instead of replacing it
        let mut module = RouteTree::new("root", "/", no_params());
        let workspaces = module.add_child(
            module.root(),
            "workspaces",
            "root.workspaces",
            "/workspaces/*",
            no_params(),
        );
        module.add_child(
            workspaces,
            "archive",
            "root.workspaces.archive",
            "/workspaces/archive",
            no_params(),
        );
        t.graft(module, "root").unwrap();
        assert_eq!(find_key(&t, "workspaces/archive"), Some("root.workspaces.archive"));
        // the pre-existing deep wildcard chain survived the merge
        assert_eq!(
            find_key(&t, "workspaces/a/stacks/b"),
            Some("root.workspaces.workspace.stacks")
        );
    }

    #[test]
    fn placeholder_segments() {
        assert_eq!(placeholder_name("{studioId}"), Some("studioId"));
        assert_eq!(placeholder_name("studios"), None);
        assert_eq!(placeholder_name("{}"), None);
        assert_eq!(placeholder_name("{a-b}"), None);
    }
}
