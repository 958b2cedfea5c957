//! Declarative dispatch on top of the navigator's raw listeners.
//!
//! Application code rarely wants to inspect every route change by hand.
//! [`NavigationClauses`] is a small builder over the listener API: one
//! handler per exact route key (`when`), ancestor handlers that catch a
//! whole subtree (`when_subroute_of`, deepest key wins), a catch-all
//! (`otherwise`) and a not-found hook. At most one handler fires per
//! navigation event, and handlers run strictly one at a time: an event
//! arriving while a handler is still running queues its handler instead of
//! interleaving it.

use crate::match_list::{compare_route_keys_desc, OrderedMatchList};
use crate::navigator::{ListenerId, Navigator, RouteSnapshot};
use crate::params::Params;
use crate::tree::key_is_subroute_of;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

type Handler = Rc<dyn Fn(RouteSnapshot, Params) -> LocalBoxFuture<'static, ()>>;

struct ClauseSet {
    when: BTreeMap<String, Handler>,
    when_subroute_of: OrderedMatchList<(String, Handler)>,
    otherwise: Option<Handler>,
}

impl ClauseSet {
    /// The single handler that applies to this route, if any: an exact
    /// `when` clause first, then the deepest matching `when_subroute_of`
    /// clause, then `otherwise`.
    fn select(&self, route: &RouteSnapshot) -> Option<Handler> {
        if let Some(handler) = self.when.get(&route.key) {
            return Some(Rc::clone(handler));
        }
        if let Some((_, handler)) = self
            .when_subroute_of
            .find(|(key, _)| key_is_subroute_of(&route.key, key))
        {
            return Some(Rc::clone(handler));
        }
        self.otherwise.as_ref().map(Rc::clone)
    }
}

/// A builder of route-change clauses. See the module documentation.
pub struct NavigationClauses {
    clauses: ClauseSet,
    when_not_found: Option<Rc<dyn Fn(&str)>>,
}

impl Default for NavigationClauses {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationClauses {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clauses: ClauseSet {
                when: BTreeMap::new(),
                when_subroute_of: OrderedMatchList::new(|(a, _): &(String, Handler), (b, _)| {
                    compare_route_keys_desc(a, b)
                }),
                otherwise: None,
            },
            when_not_found: None,
        }
    }

    /// Handle navigations to exactly this route key.
    #[must_use]
    pub fn when(
        mut self,
        key: &str,
        handler: impl Fn(RouteSnapshot, Params) -> LocalBoxFuture<'static, ()> + 'static,
    ) -> Self {
        if self
            .clauses
            .when
            .insert(key.to_string(), Rc::new(handler))
            .is_some()
        {
            tracing::warn!(key, "a \"when\" clause for this key is already set; overwriting it");
        }
        self
    }

    /// Handle navigations to this route key or any route under it. When
    /// several such clauses apply, the one with the deepest key wins.
    #[must_use]
    pub fn when_subroute_of(
        mut self,
        key: &str,
        handler: impl Fn(RouteSnapshot, Params) -> LocalBoxFuture<'static, ()> + 'static,
    ) -> Self {
        self.clauses
            .when_subroute_of
            .push((key.to_string(), Rc::new(handler)));
        self
    }

    /// Handle every navigation no other clause handles.
    #[must_use]
    pub fn otherwise(
        mut self,
        handler: impl Fn(RouteSnapshot, Params) -> LocalBoxFuture<'static, ()> + 'static,
    ) -> Self {
        if self.clauses.otherwise.is_some() {
            tracing::warn!("an \"otherwise\" clause is already set; overwriting it");
        }
        self.clauses.otherwise = Some(Rc::new(handler));
        self
    }

    /// Handle navigations to paths no registered route matches.
    #[must_use]
    pub fn when_not_found(mut self, handler: impl Fn(&str) + 'static) -> Self {
        if self.when_not_found.is_some() {
            tracing::warn!("a \"when not found\" clause is already set; overwriting it");
        }
        self.when_not_found = Some(Rc::new(handler));
        self
    }

    /// Register the clauses on a navigator.
    ///
    /// If a route is already current, the applicable handler (if any) runs
    /// before this function returns. The returned binding detaches every
    /// listener this call registered.
    pub async fn attach(self, navigator: &Rc<Navigator>) -> ClauseBinding {
        let mut listeners = Vec::new();

        if let Some(handler) = self.when_not_found {
            listeners.push(navigator.on_not_found(move |path| handler(path)));
        }

        let clauses = Rc::new(self.clauses);
        let queue: Rc<RefCell<VecDeque<LocalBoxFuture<'static, ()>>>> =
            Rc::new(RefCell::new(VecDeque::new()));
        let draining = Rc::new(Cell::new(false));
        let listener = move |route: RouteSnapshot, params: Params| {
            let clauses = Rc::clone(&clauses);
            let queue = Rc::clone(&queue);
            let draining = Rc::clone(&draining);
            async move {
                let Some(handler) = clauses.select(&route) else {
                    return;
                };
                queue.borrow_mut().push_back(handler(route, params));
                if draining.replace(true) {
                    // the running drain loop will pick this handler up
                    return;
                }
                loop {
                    let next = queue.borrow_mut().pop_front();
                    let Some(task) = next else { break };
                    task.await;
                }
                draining.set(false);
            }
            .boxed_local()
        };
        listeners.push(navigator.on_route_change_async(listener).await);

        ClauseBinding {
            navigator: Rc::clone(navigator),
            listeners,
        }
    }
}

/// The listeners a [`NavigationClauses::attach`] call registered.
pub struct ClauseBinding {
    navigator: Rc<Navigator>,
    listeners: Vec<ListenerId>,
}

impl ClauseBinding {
    /// Unregister every listener of this binding.
    pub fn detach(self) {
        for id in self.listeners {
            self.navigator.remove_listener(id);
        }
    }
}
