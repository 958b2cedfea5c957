//! The configuration parser.
//!
//! Consumes DSL text and produces a validated [`Config`], or fails with the
//! first structural error found. The DSL is a YAML-subset document with one
//! top-level route; route lines look like `+ name (path)` (or, at the root
//! only, `+ name ~ global.reference (path)`) and parameter declarations look
//! like `propagate name: kind (TypeHint)` with the modifier and hint
//! optional.

use crate::error::ConfigError;
use crate::model::{Config, RouteNode};
use crate::param::{is_valid_name, is_word, ParamKind, Parameter, PathSegment};
use serde_yaml::Value;

/// A parsed `+ name (path)` route line.
struct RouteLine<'a> {
    name: &'a str,
    /// The `~ reference` of a module link, when present.
    link: Option<&'a str>,
    path: &'a str,
}

/// Context a route inherits from its parent during the descent.
struct ParentCtx<'a> {
    local_key: &'a str,
    global_key: &'a str,
    path: &'a [PathSegment],
    query: &'a [Parameter],
}

/// Parses DSL text into a validated route tree.
pub struct ConfigParser {
    text: String,
    route_keys: Vec<String>,
}

impl ConfigParser {
    /// Create a parser over the given DSL text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            route_keys: Vec::new(),
        }
    }

    /// Parse the document.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; there is no recovery and no
    /// partial tree.
    pub fn parse(mut self) -> Result<Config, ConfigError> {
        let doc: Value =
            serde_yaml::from_str(&self.text).map_err(|_| ConfigError::InvalidDocument)?;
        let mapping = doc.as_mapping().ok_or(ConfigError::InvalidDocument)?;
        if mapping.len() != 1 {
            return Err(ConfigError::MissingSingleRoot);
        }
        let (key, value) = mapping.iter().next().ok_or(ConfigError::MissingSingleRoot)?;
        let key = key.as_str().ok_or(ConfigError::InvalidDocument)?;
        let is_module = parse_module_line(key).is_some();
        let root = self.parse_route(key, value, None)?;
        Ok(Config { root, is_module })
    }

    fn parse_route(
        &mut self,
        key: &str,
        value: &Value,
        parent: Option<&ParentCtx<'_>>,
    ) -> Result<RouteNode, ConfigError> {
        if let Some(line) = parse_module_line(key) {
            return self.parse_module_route(&line, value, parent.is_some());
        }
        let line = parse_route_line(key).ok_or_else(|| ConfigError::InvalidRouteLine {
            key: key.to_string(),
        })?;
        if !line.path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                path: line.path.to_string(),
            });
        }
        let local_key = match parent {
            Some(p) => format!("{}.{}", p.local_key, line.name),
            None => line.name.to_string(),
        };
        if self.route_keys.contains(&local_key) {
            return Err(ConfigError::DuplicateRouteKey { key: local_key });
        }
        self.route_keys.push(local_key.clone());
        let global_key = match parent {
            Some(p) => format!("{}.{}", p.global_key, line.name),
            None => line.name.to_string(),
        };

        let params = parse_params(value)?;
        let own_path = parse_path(line.path, &params)?;
        let mut path: Vec<PathSegment> = parent.map(|p| p.path.to_vec()).unwrap_or_default();
        path.extend(own_path.iter().cloned());
        let query = compute_query(params, &local_key, &own_path, parent)?;

        let mut node = RouteNode {
            name: line.name.to_string(),
            local_key,
            global_key,
            path,
            query,
            children: Vec::new(),
        };
        node.children = self.parse_children(value, &node)?;
        Ok(node)
    }

    fn parse_module_route(
        &mut self,
        line: &RouteLine<'_>,
        value: &Value,
        has_parent: bool,
    ) -> Result<RouteNode, ConfigError> {
        if has_parent {
            return Err(ConfigError::ModuleLinkBelowRoot);
        }
        if !line.path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                path: line.path.to_string(),
            });
        }
        let params = parse_params(value)?;
        let path = parse_path(line.path, &params)?;
        let query = compute_query(params, line.name, &path, None)?;
        let mut node = RouteNode {
            name: line.name.to_string(),
            local_key: line.name.to_string(),
            // The module is grafted into a host tree at runtime; its global
            // key is rooted at the linked namespace.
            global_key: line.link.unwrap_or(line.name).to_string(),
            path,
            query,
            children: Vec::new(),
        };
        node.children = self.parse_children(value, &node)?;
        Ok(node)
    }

    fn parse_children(
        &mut self,
        value: &Value,
        route: &RouteNode,
    ) -> Result<Vec<RouteNode>, ConfigError> {
        let Some(mapping) = route_body(value)? else {
            return Ok(Vec::new());
        };
        let ctx = ParentCtx {
            local_key: &route.local_key,
            global_key: &route.global_key,
            path: &route.path,
            query: &route.query,
        };
        let mut children = Vec::new();
        for (key, child_value) in mapping {
            let key = key.as_str().ok_or(ConfigError::InvalidDocument)?;
            if key.starts_with('+') {
                children.push(self.parse_route(key, child_value, Some(&ctx))?);
            }
        }
        Ok(children)
    }
}

/// The body of a route: `None` for a leaf (null value), the mapping
/// otherwise.
fn route_body(value: &Value) -> Result<Option<&serde_yaml::Mapping>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::Mapping(m) => Ok(Some(m)),
        _ => Err(ConfigError::InvalidDocument),
    }
}

/// Parse the non-route entries of a route body into parameter records.
fn parse_params(value: &Value) -> Result<Vec<Parameter>, ConfigError> {
    let Some(mapping) = route_body(value)? else {
        return Ok(Vec::new());
    };
    let mut params = Vec::new();
    for (key, value) in mapping {
        let key = key.as_str().ok_or(ConfigError::InvalidDocument)?;
        if !key.starts_with('+') {
            params.push(parse_parameter(key, value)?);
        }
    }
    Ok(params)
}

/// Parse one `modifier? name: kind (hint)?` declaration.
fn parse_parameter(key: &str, value: &Value) -> Result<Parameter, ConfigError> {
    let Some(value) = value.as_str() else {
        return Err(ConfigError::NonStringParamValue {
            key: key.to_string(),
        });
    };
    let declaration_error = || ConfigError::InvalidParamDeclaration {
        key: key.to_string(),
        value: value.to_string(),
    };

    let tokens: Vec<&str> = key.split_whitespace().collect();
    let (modifier, name) = match tokens.as_slice() {
        [name] if is_word(name) => (None, *name),
        [modifier, name] if is_word(modifier) && is_word(name) => (Some(*modifier), *name),
        _ => return Err(declaration_error()),
    };

    let (kind_str, hint) = match value.split_once(char::is_whitespace) {
        None if value.is_empty() => return Err(declaration_error()),
        None => (value, None),
        Some((kind_str, rest)) => {
            let rest = rest.trim();
            let inner = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .filter(|r| !r.is_empty())
                .ok_or_else(declaration_error)?;
            (kind_str, Some(inner))
        }
    };

    if let Some(modifier) = modifier {
        if modifier != "propagate" {
            return Err(ConfigError::UnknownModifier {
                modifier: modifier.to_string(),
                name: name.to_string(),
            });
        }
    }
    if !is_valid_name(name) {
        return Err(ConfigError::InvalidParamName {
            name: name.to_string(),
        });
    }
    let kind = ParamKind::parse(kind_str).ok_or_else(|| ConfigError::UnknownValueKind {
        kind: kind_str.to_string(),
        name: name.to_string(),
    })?;

    Ok(Parameter {
        name: name.to_string(),
        kind,
        type_hint: hint.map(str::to_string),
        propagate: modifier == Some("propagate"),
    })
}

/// Split a route's own path into segments, binding `{name}` placeholders to
/// declared parameters (or an implicit `string` parameter).
fn parse_path(path: &str, params: &[Parameter]) -> Result<Vec<PathSegment>, ConfigError> {
    let mut segments = Vec::new();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        let placeholder = part
            .strip_prefix('{')
            .and_then(|p| p.strip_suffix('}'))
            .filter(|name| !name.is_empty() && !name.contains('}'));
        match placeholder {
            Some(name) => {
                if !is_valid_name(name) {
                    return Err(ConfigError::InvalidPathVarName {
                        name: name.to_string(),
                    });
                }
                let param = params
                    .iter()
                    .find(|p| p.name == name)
                    .cloned()
                    .unwrap_or_else(|| Parameter::implicit(name));
                segments.push(PathSegment::Param(param));
            }
            None => segments.push(PathSegment::Literal(part.to_string())),
        }
    }
    Ok(segments)
}

/// Compute a node's effective query list: inherited propagated parameters
/// first, then own parameters that are not bound as path variables.
fn compute_query(
    params: Vec<Parameter>,
    route_key: &str,
    own_path: &[PathSegment],
    parent: Option<&ParentCtx<'_>>,
) -> Result<Vec<Parameter>, ConfigError> {
    let inherited: Vec<Parameter> = parent
        .map(|p| p.query.iter().filter(|q| q.propagate).cloned().collect())
        .unwrap_or_default();
    let mut query = inherited.clone();
    for param in params {
        let clashes_with_ancestor_path = parent.is_some_and(|p| {
            p.path
                .iter()
                .any(|s| s.param().is_some_and(|sp| sp.name == param.name))
        });
        if clashes_with_ancestor_path {
            return Err(ConfigError::QueryClashWithPathParam {
                name: param.name,
                key: route_key.to_string(),
            });
        }
        if inherited.iter().any(|q| q.name == param.name) {
            return Err(ConfigError::QueryClashWithPropagatedParam {
                name: param.name,
                key: route_key.to_string(),
            });
        }
        let bound_in_own_path = own_path
            .iter()
            .any(|s| s.param().is_some_and(|sp| sp.name == param.name));
        if !bound_in_own_path {
            query.push(param);
        }
    }
    Ok(query)
}

/// Parse `+ name (path)`, also recognizing the module head `name ~ ref`.
fn parse_route_line(key: &str) -> Option<RouteLine<'_>> {
    let rest = key.strip_prefix("+ ")?.trim_end();
    let rest = rest.strip_suffix(')')?;
    let open = rest.find(" (")?;
    let head = &rest[..open];
    let path = &rest[open + 2..];
    if path.is_empty() || path.contains(')') {
        return None;
    }
    match head.split_once(" ~ ") {
        Some((name, link)) => {
            if !is_word(name) || !is_dotted_word(link) {
                return None;
            }
            Some(RouteLine {
                name,
                link: Some(link),
                path,
            })
        }
        None => {
            if !is_word(head) {
                return None;
            }
            Some(RouteLine {
                name: head,
                link: None,
                path,
            })
        }
    }
}

/// Parse the module variant only: `+ name ~ reference (path)`.
fn parse_module_line(key: &str) -> Option<RouteLine<'_>> {
    parse_route_line(key).filter(|line| line.link.is_some())
}

/// `\w+(\.\w+)*`
fn is_dotted_word(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        ConfigParser::new(text).parse()
    }

    #[test]
    fn parses_root_with_query_params() {
        let config =
            parse("+ root (/):\n  + studios (/studios):\n    search: string\n    limit: number")
                .unwrap();
        assert!(!config.is_module);
        assert_eq!(config.root.local_key, "root");
        assert_eq!(config.root.path_template(), "/");
        let studios = &config.root.children[0];
        assert_eq!(studios.local_key, "root.studios");
        assert_eq!(studios.global_key, "root.studios");
        assert_eq!(studios.path_template(), "/studios");
        let names: Vec<(&str, ParamKind)> = studios
            .query
            .iter()
            .map(|p| (p.name.as_str(), p.kind))
            .collect();
        assert_eq!(
            names,
            vec![("search", ParamKind::String), ("limit", ParamKind::Number)]
        );
    }

    #[test]
    fn children_inherit_path_prefix() {
        let config = parse(
            "+ root (/):\n  + studios (/studios):\n    + studio (/{studioId}):\n      + stacks (/stacks):",
        )
        .unwrap();
        let studio = &config.root.children[0].children[0];
        assert_eq!(studio.path_template(), "/studios/{studioId}");
        let stacks = &studio.children[0];
        assert_eq!(stacks.local_key, "root.studios.studio.stacks");
        assert_eq!(stacks.path_template(), "/studios/{studioId}/stacks");
    }

    #[test]
    fn path_variable_binds_to_declared_param() {
        let config = parse("+ root (/):\n  + item (/items/{id}):\n    id: number").unwrap();
        let item = &config.root.children[0];
        let bound = item.path[1].param().unwrap();
        assert_eq!(bound.kind, ParamKind::Number);
        // bound variables do not re-appear as query parameters
        assert!(item.query.is_empty());
    }

    #[test]
    fn undeclared_path_variable_defaults_to_string() {
        let config = parse("+ root (/):\n  + item (/items/{id}):").unwrap();
        let bound = config.root.children[0].path[1].param().unwrap();
        assert_eq!(bound.kind, ParamKind::String);
        assert_eq!(bound.type_hint, None);
    }

    #[test]
    fn type_hint_is_captured() {
        let config = parse("+ root (/):\n  + a (/a):\n    limit: number (Foo.Bar)").unwrap();
        let limit = &config.root.children[0].query[0];
        assert_eq!(limit.kind, ParamKind::Number);
        assert_eq!(limit.type_hint.as_deref(), Some("Foo.Bar"));
    }

    #[test]
    fn propagated_param_is_visible_to_descendants() {
        let config = parse(
            "+ root (/):\n  propagate search: string\n  + a (/a):\n    + b (/b):\n  + c (/c):",
        )
        .unwrap();
        let a = &config.root.children[0];
        let b = &a.children[0];
        assert_eq!(a.query[0].name, "search");
        assert!(a.query[0].propagate);
        assert_eq!(b.query[0].name, "search");
        // the sibling also sees it: propagation flows to every descendant
        assert_eq!(config.root.children[1].query[0].name, "search");
    }

    #[test]
    fn propagation_does_not_leak_across_subtrees() {
        let config = parse(
            "+ root (/):\n  + a (/a):\n    propagate search: string\n    + deep (/deep):\n  + b (/b):",
        )
        .unwrap();
        let a = &config.root.children[0];
        assert_eq!(a.children[0].query[0].name, "search");
        let b = &config.root.children[1];
        assert!(b.query.is_empty());
    }

    #[test]
    fn query_clash_with_propagated_param_is_rejected() {
        let err = parse("+ root (/):\n  propagate search: string\n  + a (/a):\n    search: string")
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::QueryClashWithPropagatedParam {
                name: "search".into(),
                key: "root.a".into()
            }
        );
    }

    #[test]
    fn query_clash_with_ancestor_path_param_is_rejected() {
        let err = parse("+ root (/):\n  + a (/{id}):\n    + b (/b):\n      id: string").unwrap_err();
        assert_eq!(
            err,
            ConfigError::QueryClashWithPathParam {
                name: "id".into(),
                key: "root.a.b".into()
            }
        );
    }

    #[test]
    fn duplicate_route_key_is_rejected() {
        let err = parse("+ root (/):\n  + a (/x):\n  + a (/y):").unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRouteKey { key: "root.a".into() });
    }

    #[test]
    fn module_link_at_root_sets_global_key() {
        let config = parse("+ stacks ~ root.studios.stacks (/stacks):\n  + stack (/{stackId}):")
            .unwrap();
        assert!(config.is_module);
        assert_eq!(config.root.local_key, "stacks");
        assert_eq!(config.root.global_key, "root.studios.stacks");
        let stack = &config.root.children[0];
        assert_eq!(stack.local_key, "stacks.stack");
        assert_eq!(stack.global_key, "root.studios.stacks.stack");
    }

    #[test]
    fn module_link_below_root_is_rejected() {
        let err = parse("+ root (/):\n  + sub ~ other.place (/sub):").unwrap_err();
        assert_eq!(err, ConfigError::ModuleLinkBelowRoot);
    }

    #[test]
    fn path_must_start_with_slash() {
        let err = parse("+ root (relative):").unwrap_err();
        assert_eq!(err, ConfigError::InvalidPath { path: "relative".into() });
    }

    #[test]
    fn malformed_route_line_is_rejected() {
        let err = parse("+ root:").unwrap_err();
        assert_eq!(err, ConfigError::InvalidRouteLine { key: "+ root".into() });
        let err = parse("+ two words (/):").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRouteLine { .. }));
    }

    #[test]
    fn multiple_roots_are_rejected() {
        let err = parse("+ a (/a):\n+ b (/b):").unwrap_err();
        assert_eq!(err, ConfigError::MissingSingleRoot);
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert_eq!(parse("just text").unwrap_err(), ConfigError::InvalidDocument);
    }

    #[test]
    fn non_string_param_value_is_rejected() {
        let err = parse("+ root (/):\n  limit: 42").unwrap_err();
        assert_eq!(err, ConfigError::NonStringParamValue { key: "limit".into() });
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        let err = parse("+ root (/):\n  shared search: string").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownModifier {
                modifier: "shared".into(),
                name: "search".into()
            }
        );
    }

    #[test]
    fn unknown_value_kind_is_rejected() {
        let err = parse("+ root (/):\n  limit: int").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownValueKind {
                kind: "int".into(),
                name: "limit".into()
            }
        );
    }

    #[test]
    fn invalid_param_name_is_rejected() {
        let err = parse("+ root (/):\n  1limit: number").unwrap_err();
        assert_eq!(err, ConfigError::InvalidParamName { name: "1limit".into() });
    }

    #[test]
    fn invalid_path_var_name_is_rejected() {
        let err = parse("+ root (/):\n  + a (/items/{1id}):").unwrap_err();
        assert_eq!(err, ConfigError::InvalidPathVarName { name: "1id".into() });
    }

    #[test]
    fn malformed_param_declaration_is_rejected() {
        let err = parse("+ root (/):\n  a b c: string").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParamDeclaration { .. }));
        let err = parse("+ root (/):\n  limit: number Foo").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParamDeclaration { .. }));
    }

    #[test]
    fn wildcard_segment_is_a_literal() {
        let config = parse("+ root (/):\n  + account (/account/*):").unwrap();
        let account = &config.root.children[0];
        assert_eq!(account.path_template(), "/account/*");
    }

    #[test]
    fn local_keys_are_unique_and_paths_concatenate() {
        let config = parse(
            "+ root (/):\n  + a (/a):\n    + b (/b):\n      + c (/c):\n  + d (/d):",
        )
        .unwrap();
        let mut keys = Vec::new();
        let mut paths = Vec::new();
        config.root.walk(&mut |node| {
            keys.push(node.local_key.clone());
            paths.push(node.path_template());
        });
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), keys.len());
        assert_eq!(paths, vec!["/", "/a", "/a/b", "/a/b/c", "/d"]);
    }
}
