//! Parse configuration.
//!
//! A [`ParseConfig`] decides how the `anyOf`/`oneOf` combinators of a schema
//! are interpreted. It is resolved once per top-level schema and carried on
//! every [`SchemaNode`](crate::SchemaNode) derived from it.
//!
//! # Configuration File Format
//!
//! ```toml
//! [anyOf]
//! type = "likeAllOf"
//!
//! [oneOf]
//! groupTitle = "variants"
//! type = "asAdditionalColumn"
//! ```

use std::{fmt, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Callback naming an option from its full option-index path.
pub type OptionNameFn = Arc<dyn Fn(&[usize]) -> String + Send + Sync>;

/// How the branches of an optional combinator are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OptionalsKind {
    /// Fold all branches in, as if they were listed under `allOf`.
    LikeAllOf,
    /// Offer the branches as distinct, selectable options.
    AsAdditionalColumn,
}

/// Settings for one optional combinator (`anyOf` or `oneOf`).
#[derive(Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionalsConfig {
    /// Title shown for a group of options. Defaults per combinator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    /// Presentation of the branches.
    #[serde(rename = "type")]
    pub kind: OptionalsKind,
    /// Custom option naming.
    #[serde(skip)]
    pub option_name_for_index: Option<OptionNameFn>,
}

impl fmt::Debug for OptionalsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalsConfig")
            .field("group_title", &self.group_title)
            .field("kind", &self.kind)
            .field(
                "option_name_for_index",
                &self.option_name_for_index.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}

impl OptionalsConfig {
    /// Creates settings with the default title and option naming.
    pub fn new(kind: OptionalsKind) -> Self {
        Self {
            group_title: None,
            kind,
            option_name_for_index: None,
        }
    }

    /// Overrides the group title.
    pub fn with_group_title(mut self, title: impl Into<String>) -> Self {
        self.group_title = Some(title.into());
        self
    }

    /// Installs a custom option naming callback.
    pub fn with_option_name_for_index(
        mut self,
        name: impl Fn(&[usize]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.option_name_for_index = Some(Arc::new(name));
        self
    }

    /// Whether branches become selectable options instead of being folded in.
    pub fn treat_as_separate_options(&self) -> bool {
        self.kind == OptionalsKind::AsAdditionalColumn
    }
}

/// Default option naming: `"Option 2-1"` for the path `[1, 0]`.
pub fn default_option_name(indexes: &[usize]) -> String {
    let numbers = indexes
        .iter()
        .map(|index| (index + 1).to_string())
        .collect::<Vec<_>>();
    format!("Option {}", numbers.join("-"))
}

/// Combinator handling for one top-level schema.
///
/// A combinator without an entry is ignored entirely: its sub-schemas
/// contribute nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseConfig {
    /// Handling of `anyOf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<OptionalsConfig>,
    /// Handling of `oneOf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<OptionalsConfig>,
}

impl ParseConfig {
    /// Enables `anyOf` handling.
    pub fn with_any_of(mut self, config: OptionalsConfig) -> Self {
        self.any_of = Some(config);
        self
    }

    /// Enables `oneOf` handling.
    pub fn with_one_of(mut self, config: OptionalsConfig) -> Self {
        self.one_of = Some(config);
        self
    }

    pub(crate) fn is_like_all_of(config: &Option<OptionalsConfig>) -> bool {
        config
            .as_ref()
            .is_some_and(|c| c.kind == OptionalsKind::LikeAllOf)
    }
}
