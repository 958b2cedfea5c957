//! The navigator: the application's navigation coordinator.
//!
//! One instance per application, owned by the bootstrap scope and shared as
//! `Rc<Navigator>`. It owns the live [`RouteTree`], the current match, and
//! the listener registries, and re-resolves the URL on every navigation
//! event.
//!
//! Dispatch ordering is strict: for one navigation event every asynchronous
//! listener is started, all of them are awaited, and only then do the
//! synchronous listeners run. Overlapping events queue: event N+1 is not
//! handled while event N's listeners are still draining, and nothing is ever
//! cancelled.

use crate::error::NavigationSetupError;
use crate::history::History;
use crate::params::{
    decode_occurrences, decode_path_segment, path_segment_value, query_values, Params,
};
use crate::tree::{placeholder_name, PathMatch, RouteId, RouteTree};
use crate::urlenc::{percent_decode, percent_encode, split_path};
use futures::future::{join_all, LocalBoxFuture};
use navtree_config::ParamKind;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use url::{form_urlencoded, Url};

type SyncListener = Rc<dyn Fn(&RouteSnapshot, &Params)>;
type AsyncListener = Rc<dyn Fn(RouteSnapshot, Params) -> LocalBoxFuture<'static, ()>>;
type NotFoundListener = Rc<dyn Fn(&str)>;

/// Handle returned by listener registration; passing it to
/// [`Navigator::remove_listener`] unregisters the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A cheap listener-facing view of a live route node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSnapshot {
    pub id: RouteId,
    pub key: String,
    pub path: String,
}

/// Options for [`Navigator::link`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Merge the navigator's current parameters into the produced query
    /// string. Defaults to false.
    pub merge_search_parameters: bool,
}

/// Options for [`Navigator::go`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GoOptions {
    /// Merge the navigator's current parameters into the produced query
    /// string. Unset means true.
    pub merge_search_parameters: Option<bool>,
    /// Replace the current history entry instead of pushing a new one.
    /// Unset means "replace when the target route is already active".
    pub replace: Option<bool>,
    /// Change the URL without firing a navigation event. A later explicit
    /// [`Navigator::update_route`] call will pick the change up.
    pub prevent_default: bool,
}

/// The navigation coordinator. See the module documentation.
pub struct Navigator {
    tree: RefCell<RouteTree>,
    history: Box<dyn History>,
    use_hash: bool,
    current_route: RefCell<Option<RouteSnapshot>>,
    current_params: RefCell<Params>,
    route_change: RefCell<Vec<(ListenerId, SyncListener)>>,
    async_route_change: RefCell<Vec<(ListenerId, AsyncListener)>>,
    not_found: RefCell<Vec<(ListenerId, NotFoundListener)>>,
    next_listener: Cell<u64>,
    event_queue: RefCell<VecDeque<Url>>,
    dispatching: Cell<bool>,
}

impl Navigator {
    /// Create a navigator over a live tree and a history implementation.
    ///
    /// With `use_hash`, paths live in the URL fragment (`domain/#/path`)
    /// instead of the URL path. The initial URL is not resolved here; await
    /// [`Navigator::update_route`] once after construction.
    pub fn new(tree: RouteTree, history: Box<dyn History>, use_hash: bool) -> Rc<Self> {
        Rc::new(Self {
            tree: RefCell::new(tree),
            history,
            use_hash,
            current_route: RefCell::new(None),
            current_params: RefCell::new(Params::new()),
            route_change: RefCell::new(Vec::new()),
            async_route_change: RefCell::new(Vec::new()),
            not_found: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            event_queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
        })
    }

    #[must_use]
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// The currently matched route, if any.
    #[must_use]
    pub fn current_route(&self) -> Option<RouteSnapshot> {
        self.current_route.borrow().clone()
    }

    /// The parameter assignment of the current route.
    #[must_use]
    pub fn current_params(&self) -> Params {
        self.current_params.borrow().clone()
    }

    /// Resolve a dotted route key against the live tree.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<RouteId> {
        self.tree.borrow().resolve_key(key)
    }

    /// The root-first ancestor chain of a route, as snapshots.
    #[must_use]
    pub fn branch(&self, id: RouteId) -> Vec<RouteSnapshot> {
        let tree = self.tree.borrow();
        tree.branch(id)
            .into_iter()
            .map(|node| snapshot_of(&tree, node))
            .collect()
    }

    /// Extract the evaluated path from a URL.
    ///
    /// In hash mode this is the fragment without its leading slash and
    /// without the embedded query; otherwise the URL path without its
    /// leading slash. The result never starts with `/`.
    #[must_use]
    pub fn get_path(&self, url: &Url) -> String {
        if self.use_hash {
            let fragment = url.fragment().unwrap_or("");
            let fragment = fragment.strip_prefix('/').unwrap_or(fragment);
            let path = fragment.split_once('?').map_or(fragment, |(path, _)| path);
            path.to_string()
        } else {
            let path = url.path();
            path.strip_prefix('/').unwrap_or(path).to_string()
        }
    }

    // ==== RESOLUTION & DISPATCH ====

    /// Re-resolve the current URL and notify listeners.
    ///
    /// On a successful match the route and its parameters become current and
    /// every listener is notified (async first, then sync). On failure the
    /// current state is left untouched and only the not-found listeners run.
    /// Calls made while a previous event is still draining are queued, not
    /// interleaved.
    pub async fn update_route(&self) {
        self.event_queue
            .borrow_mut()
            .push_back(self.history.location());
        if self.dispatching.replace(true) {
            // the active dispatcher will drain this event in order
            return;
        }
        loop {
            let next = self.event_queue.borrow_mut().pop_front();
            let Some(url) = next else { break };
            self.dispatch(&url).await;
        }
        self.dispatching.set(false);
    }

    async fn dispatch(&self, url: &Url) {
        let path = self.get_path(url);
        let found = self.tree.borrow().find_by_path(&path);
        match found {
            Some(id) => self.handle_route_change(id, url).await,
            None => self.handle_not_found(&path),
        }
    }

    async fn handle_route_change(&self, id: RouteId, url: &Url) {
        let snapshot = snapshot_of(&self.tree.borrow(), id);
        *self.current_route.borrow_mut() = Some(snapshot.clone());
        let params = self.extract_params(url, id);
        *self.current_params.borrow_mut() = params.clone();

        let async_listeners: Vec<AsyncListener> = self
            .async_route_change
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        join_all(
            async_listeners
                .iter()
                .map(|listener| listener(snapshot.clone(), params.clone())),
        )
        .await;

        let sync_listeners: Vec<SyncListener> = self
            .route_change
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in &sync_listeners {
            listener(&snapshot, &params);
        }
    }

    fn handle_not_found(&self, path: &str) {
        tracing::error!(path, "route not registered");
        let listeners: Vec<NotFoundListener> = self
            .not_found
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in &listeners {
            listener(path);
        }
    }

    // ==== PARAMETER EXTRACTION ====

    fn extract_params(&self, url: &Url, id: RouteId) -> Params {
        let mut params = self.extract_query_params(url, id);
        // path parameters win over query parameters of the same name
        params.extend(self.extract_path_params(url, id));
        params
    }

    fn query_pairs(&self, url: &Url) -> Vec<(String, String)> {
        if self.use_hash {
            let fragment = url.fragment().unwrap_or("");
            match fragment.split_once('?') {
                Some((_, query)) => form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
                None => Vec::new(),
            }
        } else {
            url.query_pairs().into_owned().collect()
        }
    }

    fn extract_query_params(&self, url: &Url, id: RouteId) -> Params {
        let pairs = self.query_pairs(url);
        let tree = self.tree.borrow();
        let metadata = tree.params(id);
        let route_key = tree.key(id);
        let mut params = Params::new();
        for (name, _) in &pairs {
            if params.contains_key(name) {
                continue;
            }
            // names not declared on the matched route are ignored
            let Some(kind) = metadata.get(name).copied() else {
                continue;
            };
            let values: Vec<String> = pairs
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .collect();
            params.insert(name.clone(), decode_occurrences(name, &values, kind, route_key));
        }
        params
    }

    fn extract_path_params(&self, url: &Url, id: RouteId) -> Params {
        let tree = self.tree.borrow();
        let template = tree.path(id);
        let metadata = tree.params(id);
        let route_key = tree.key(id);
        let path = self.get_path(url);
        let route_parts = split_path(template);
        let url_parts = split_path(&path);
        let mut params = Params::new();
        for (index, part) in route_parts.iter().enumerate() {
            let Some(name) = placeholder_name(part) else {
                continue;
            };
            let Some(raw) = url_parts.get(index) else {
                continue;
            };
            let decoded = percent_decode(raw, false).unwrap_or_else(|| {
                tracing::error!(
                    param = name,
                    value = *raw,
                    route = route_key,
                    "invalid percent-encoding in path segment; using the raw value"
                );
                (*raw).to_string()
            });
            let kind = metadata.get(name).copied().unwrap_or(ParamKind::String);
            params.insert(
                name.to_string(),
                decode_path_segment(name, &decoded, kind, route_key),
            );
        }
        params
    }

    // ==== LINKS & NAVIGATION ====

    /// Build the relative URL for a route with the given parameters.
    ///
    /// Path placeholders always draw from the current parameters overlaid
    /// with `params`; the query string draws from the same pool only with
    /// `merge_search_parameters`, otherwise from `params` alone. A missing
    /// path parameter produces an empty segment and a diagnostic, never an
    /// error.
    #[must_use]
    pub fn link(&self, id: RouteId, params: &Params, options: LinkOptions) -> String {
        let mut merged = self.current_params.borrow().clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        let tree = self.tree.borrow();
        let route_key = tree.key(id);
        let template = tree.path(id);
        let template = template.strip_suffix("/*").unwrap_or(template);

        let mut consumed: Vec<&str> = Vec::new();
        let mut segments: Vec<String> = Vec::new();
        for part in template.split('/') {
            match placeholder_name(part) {
                Some(name) => {
                    let serialized = match merged.get(name) {
                        Some(value) => path_segment_value(value),
                        None => {
                            tracing::warn!(
                                param = name,
                                route = route_key,
                                "missing value for path parameter; using an empty segment"
                            );
                            String::new()
                        }
                    };
                    consumed.push(name);
                    segments.push(percent_encode(&serialized));
                }
                None => segments.push(part.to_string()),
            }
        }
        let mut path = segments.join("/");
        if path.is_empty() {
            path.push('/');
        }

        let source = if options.merge_search_parameters {
            &merged
        } else {
            params
        };
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for name in tree.params(id).keys() {
            if consumed.iter().any(|c| c == name) {
                continue;
            }
            let Some(value) = source.get(name) else {
                continue;
            };
            for occurrence in query_values(value) {
                serializer.append_pair(name, &occurrence);
            }
        }
        let query = serializer.finish();

        if self.use_hash {
            let pathname = self.history.location().path().to_string();
            if query.is_empty() {
                format!("{pathname}#{path}")
            } else {
                format!("{pathname}#{path}?{query}")
            }
        } else if query.is_empty() {
            path
        } else {
            format!("{path}?{query}")
        }
    }

    /// Navigate to a route through the history API.
    ///
    /// With no explicit `replace` option, the current entry is replaced when
    /// the target route is already active (a parameter-only change) and a
    /// new entry is pushed otherwise.
    pub async fn go(&self, id: RouteId, params: &Params, options: GoOptions) {
        let replace = options.replace.unwrap_or_else(|| self.is_active(id));
        let merge = options.merge_search_parameters.unwrap_or(true);
        let link = self.link(
            id,
            params,
            LinkOptions {
                merge_search_parameters: merge,
            },
        );
        if replace {
            self.history.replace(&link);
        } else {
            self.history.push(&link);
        }
        if !options.prevent_default {
            self.update_route().await;
        }
    }

    /// Whether the current URL matches this route exactly.
    #[must_use]
    pub fn is_active(&self, id: RouteId) -> bool {
        let path = self.get_path(&self.history.location());
        self.tree.borrow().match_path(id, &path) == PathMatch::Exact
    }

    /// Whether the current URL matches this route or one of its subroutes.
    #[must_use]
    pub fn is_subroute_active(&self, id: RouteId) -> bool {
        let path = self.get_path(&self.history.location());
        if path.is_empty() {
            return false;
        }
        matches!(
            self.tree.borrow().match_path(id, &path),
            PathMatch::Exact | PathMatch::Subroute
        )
    }

    /// Graft a module tree at `anchor_key`, then re-resolve the current URL.
    ///
    /// # Errors
    ///
    /// Fails on anchor or collision problems; the tree is left untouched.
    pub async fn update_navigation_tree(
        &self,
        module: RouteTree,
        anchor_key: &str,
    ) -> Result<(), NavigationSetupError> {
        self.tree.borrow_mut().graft(module, anchor_key)?;
        self.update_route().await;
        Ok(())
    }

    // ==== LISTENERS ====

    /// Register a synchronous route-change listener.
    ///
    /// If a route is already current it is replayed to the listener
    /// immediately.
    pub fn on_route_change(
        &self,
        listener: impl Fn(&RouteSnapshot, &Params) + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        let listener: SyncListener = Rc::new(listener);
        self.route_change
            .borrow_mut()
            .push((id, Rc::clone(&listener)));
        let current = self.current_route.borrow().clone();
        if let Some(snapshot) = current {
            let params = self.current_params.borrow().clone();
            listener(&snapshot, &params);
        }
        id
    }

    /// Register an asynchronous route-change listener.
    ///
    /// Async listeners run before every synchronous listener on each event.
    /// If a route is already current, the listener's immediate replay is
    /// awaited before this function returns.
    pub async fn on_route_change_async(
        &self,
        listener: impl Fn(RouteSnapshot, Params) -> LocalBoxFuture<'static, ()> + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        let listener: AsyncListener = Rc::new(listener);
        self.async_route_change
            .borrow_mut()
            .push((id, Rc::clone(&listener)));
        let current = self.current_route.borrow().clone();
        if let Some(snapshot) = current {
            let params = self.current_params.borrow().clone();
            listener(snapshot, params).await;
        }
        id
    }

    /// Register a listener for navigations to unregistered routes.
    pub fn on_not_found(&self, listener: impl Fn(&str) + 'static) -> ListenerId {
        let id = self.next_listener_id();
        self.not_found.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a previously registered listener. Returns false when the id is
    /// unknown (e.g. already removed).
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        fn remove_from<T>(list: &RefCell<Vec<(ListenerId, T)>>, id: ListenerId) -> bool {
            let mut list = list.borrow_mut();
            match list.iter().position(|(entry, _)| *entry == id) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            }
        }
        remove_from(&self.route_change, id)
            || remove_from(&self.async_route_change, id)
            || remove_from(&self.not_found, id)
    }

    fn next_listener_id(&self) -> ListenerId {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        ListenerId(id)
    }
}

fn snapshot_of(tree: &RouteTree, id: RouteId) -> RouteSnapshot {
    RouteSnapshot {
        id,
        key: tree.key(id).to_string(),
        path: tree.path(id).to_string(),
    }
}
