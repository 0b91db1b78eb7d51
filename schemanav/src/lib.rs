//! # schemanav
//!
//! Reference resolution and a combinator algebra for navigating JSON Schema
//! definitions.
//!
//! A schema is wrapped into a [`SchemaNode`], which carries the
//! [`RefScope`] its `$ref`s resolve against. Its `allOf`/`anyOf`/`oneOf`
//! structure is turned into a [`SchemaGroup`] tree, which answers property,
//! field, array item and option queries, optionally narrowed to one selected
//! option.
//!
//! ## Features
//!
//! - `$ref` resolution inside a document and across linked documents
//! - `definitions` and `$defs`, `$id` and legacy `id`
//! - Configurable handling of `anyOf`/`oneOf`: merged like `allOf` or offered
//!   as separate options
//! - Option-index paths to address one combination of options
//! - Column-wise navigation through [`Inspector`]
//!
//! ## Quick Start
//!
//! ```rust
//! use schemanav::{
//!     OptionalsConfig, OptionalsKind, ParseConfig, SchemaNode, create_group_from_schema,
//!     get_options_in_schema_group, get_properties_from_schema_group,
//! };
//! use serde_json::json;
//!
//! let config = ParseConfig::default()
//!     .with_one_of(OptionalsConfig::new(OptionalsKind::AsAdditionalColumn));
//! let node = SchemaNode::new(
//!     json!({
//!         "oneOf": [
//!             { "properties": { "path": { "type": "string" } } },
//!             { "properties": { "url": { "type": "string" } } }
//!         ]
//!     }),
//!     config,
//! );
//!
//! let group = create_group_from_schema(&node).unwrap();
//! let options = get_options_in_schema_group(&group);
//! assert_eq!(options.index_permutations(), vec![vec![0], vec![1]]);
//!
//! let second = get_properties_from_schema_group(&group, Some(&[1])).unwrap();
//! assert!(second.contains_key("url"));
//! ```
//!
//! ## Modules
//!
//! - [`scope`] - Reference scopes and `$ref` resolution
//! - [`node`] - Schema nodes and node-level queries
//! - [`group`] - The combinator algebra
//! - [`query`] - Group construction and group-level queries
//! - [`data`] - Column-wise navigation for rendering layers

#[macro_use]
extern crate log;

/// Parse configuration for `anyOf`/`oneOf` handling.
pub mod config;

/// Descriptive fields of a selection.
pub mod details;

/// Error types.
pub mod error;

pub mod group;

pub mod node;

pub mod options;

pub mod query;

pub mod scope;

pub mod util;

/// Column-wise navigation over a set of root schemas.
pub mod data;

pub use config::{OptionNameFn, OptionalsConfig, OptionalsKind, ParseConfig};
pub use data::{ArrayItemNamingFn, Column, Inspector, SelectionStep};
pub use details::SchemaDetails;
pub use error::{Result, SchemaError};
pub use group::{GroupEntry, GroupKind, OptionTarget, SchemaGroup};
pub use node::{Properties, SchemaNode};
pub use options::OptionsTree;
pub use query::*;
pub use scope::RefScope;
pub use serde_json::Value;
