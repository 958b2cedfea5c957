//! Route-tree runtime and async navigator.
//!
//! This crate takes the static model produced by `navtree-config` and turns
//! it into a live, matchable [`RouteTree`], then drives it with a
//! [`Navigator`]: URL resolution, parameter extraction, link construction,
//! history-backed navigation and listener dispatch. [`NavigationClauses`]
//! adds declarative per-route handlers on top of the raw listener API.
//!
//! The runtime half never panics on malformed input: unparsable parameter
//! values degrade to documented fallbacks and unknown paths go through the
//! not-found channel, with `tracing` diagnostics in both cases.
//!
//! # Example
//!
//! ```
//! use navtree_core::{MemoryHistory, Navigator, RouteTree};
//! use navtree_config::ConfigParser;
//!
//! futures::executor::block_on(async {
//!     let config = ConfigParser::new("+ root (/):\n  + studios (/studios):")
//!         .parse()
//!         .unwrap();
//!     let history = MemoryHistory::new("https://example.com/studios").unwrap();
//!     let navigator = Navigator::new(
//!         RouteTree::from_config(&config),
//!         Box::new(history),
//!         false,
//!     );
//!     navigator.update_route().await;
//!     assert_eq!(navigator.current_route().unwrap().key, "root.studios");
//! });
//! ```

#![forbid(unsafe_code)]

mod clauses;
mod error;
mod history;
mod match_list;
mod navigator;
mod params;
mod tree;
mod urlenc;

pub use clauses::{ClauseBinding, NavigationClauses};
pub use error::NavigationSetupError;
pub use history::{History, MemoryHistory};
pub use match_list::{compare_route_keys_desc, OrderedMatchList};
pub use navigator::{GoOptions, LinkOptions, ListenerId, Navigator, RouteSnapshot};
pub use params::{ParamValue, Params};
pub use tree::{key_is_subroute_of, PathMatch, RouteId, RouteTree};
pub use urlenc::{percent_decode, percent_encode, split_path};
