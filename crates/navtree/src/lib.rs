//! Declarative, tree-shaped client-side router.
//!
//! navtree turns a small YAML-like DSL into a matchable route tree and
//! drives it with an async navigator:
//!
//! - **Declarative configuration** — one document describes the whole route
//!   hierarchy, with typed path and query parameters
//! - **Tree-shaped matching** — URL paths resolve structurally, with
//!   wildcard routes as module extension points
//! - **Async dispatch** — listeners and per-route clauses run in a strict,
//!   serialized order; navigation is never aborted by malformed input
//! - **Runtime composition** — independently built modules graft onto a
//!   running tree
//!
//! # Quick Start
//!
//! ```
//! use navtree::prelude::*;
//!
//! futures::executor::block_on(async {
//!     let config = ConfigParser::new(
//!         "+ root (/):\n  + studios (/studios):\n    like: string",
//!     )
//!     .parse()
//!     .unwrap();
//!     let history = MemoryHistory::new("https://example.com/studios?like=vm").unwrap();
//!     let navigator = Navigator::new(
//!         RouteTree::from_config(&config),
//!         Box::new(history),
//!         false,
//!     );
//!     navigator.on_route_change(|route, params| {
//!         println!("now at {} ({params:?})", route.key);
//!     });
//!     navigator.update_route().await;
//!     assert_eq!(navigator.current_route().unwrap().key, "root.studios");
//! });
//! ```
//!
//! # Crate Structure
//!
//! - [`config`] — DSL parser and the static route-tree model
//! - [`core`] — live tree, matching, parameters, navigator and clauses

#![forbid(unsafe_code)]

// Re-export crates
pub use navtree_config as config;
pub use navtree_core as core;

// Re-export commonly used types
pub use navtree_config::{
    Config, ConfigError, ConfigParser, ParamKind, Parameter, PathSegment, RouteNode,
};
pub use navtree_core::{
    ClauseBinding, GoOptions, History, LinkOptions, ListenerId, MemoryHistory, NavigationClauses,
    NavigationSetupError, Navigator, ParamValue, Params, PathMatch, RouteId, RouteSnapshot,
    RouteTree,
};

/// The types most applications need, in one import.
pub mod prelude {
    pub use navtree_config::{ConfigError, ConfigParser, ParamKind};
    pub use navtree_core::{
        GoOptions, History, LinkOptions, MemoryHistory, NavigationClauses, Navigator, ParamValue,
        Params, RouteTree,
    };
}
