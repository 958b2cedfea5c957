//! Navigation DSL parser and static route-tree model.
//!
//! This crate turns the declarative route DSL (a one-root, 2-space-indented
//! nested mapping) into a validated tree of plain records. The runtime crate
//! (`navtree-core`) instantiates a live, matchable tree from this model; a
//! code generator may consume it to emit typed accessors.
//!
//! # Example
//!
//! ```
//! use navtree_config::ConfigParser;
//!
//! let config = ConfigParser::new(
//!     "+ root (/):\n  + studios (/studios):\n    search: string\n    limit: number",
//! )
//! .parse()
//! .unwrap();
//! assert_eq!(config.root.children[0].local_key, "root.studios");
//! ```

#![forbid(unsafe_code)]

mod error;
mod model;
mod param;
mod parser;

pub use error::ConfigError;
pub use model::{Config, RouteNode};
pub use param::{ParamKind, Parameter, PathSegment};
pub use parser::ConfigParser;
