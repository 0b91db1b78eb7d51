//! Column-wise navigation over a set of root schemas.
//!
//! A rendering layer shows a selection as a row of columns:
//!
//! - the root schemas,
//! - for each selected item either its options or its nested items,
//! - for each selected leaf option the nested items of that option.
//!
//! [`Inspector`] computes those columns from a list of [`SelectionStep`]s.

mod column;
mod inspector;

pub use column::{Column, SelectionStep};
pub use inspector::{ArrayItemNamingFn, DEFAULT_ARRAY_ITEM_NAME, Inspector};
