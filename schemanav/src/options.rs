//! Options trees and option-index path utilities.

use std::fmt;

use serde::Serialize;

use crate::config::{OptionNameFn, default_option_name};

/// The selectable options of a group, as consumed by a rendering layer.
///
/// An empty tree (`options == None`) means "nothing to choose". Otherwise
/// each element of `options` is the tree of one option, addressed by its
/// position in an option-index path.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsTree {
    /// Sub-trees of the options, if there is a choice to make.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionsTree>>,
    /// Title of the group offering the options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    /// Custom naming of the options.
    #[serde(skip)]
    pub option_name_for_index: Option<OptionNameFn>,
}

impl fmt::Debug for OptionsTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsTree")
            .field("options", &self.options)
            .field("group_title", &self.group_title)
            .finish_non_exhaustive()
    }
}

impl PartialEq for OptionsTree {
    fn eq(&self, other: &Self) -> bool {
        self.options == other.options && self.group_title == other.group_title
    }
}

impl OptionsTree {
    /// A tree offering `options`.
    pub fn with_options(options: Vec<OptionsTree>) -> Self {
        Self {
            options: Some(options),
            ..Self::default()
        }
    }

    /// Whether there is anything to choose.
    pub fn has_options(&self) -> bool {
        self.options.is_some()
    }

    /// The sub-tree selected by `path`, or `None` when the path leaves the
    /// tree.
    pub fn at(&self, path: &[usize]) -> Option<&OptionsTree> {
        path.iter()
            .try_fold(self, |tree, &index| tree.options.as_ref()?.get(index))
    }

    /// Whether `path` selects an option that offers no further choice.
    pub fn is_leaf_path(&self, path: &[usize]) -> bool {
        !path.is_empty() && self.at(path).is_some_and(|tree| !tree.has_options())
    }

    /// Display name of the option at `path`.
    ///
    /// Uses the naming of the group offering that option, or
    /// [`default_option_name`]. `None` when the path leaves the tree.
    pub fn option_name(&self, path: &[usize]) -> Option<String> {
        let (_, parent_path) = path.split_last()?;
        let parent = self.at(parent_path)?;
        self.at(path)?;
        Some(match &parent.option_name_for_index {
            Some(name) => name(path),
            None => default_option_name(path),
        })
    }

    /// Every option-index path leading to an option without further choice.
    pub fn index_permutations(&self) -> Vec<Vec<usize>> {
        let Some(options) = &self.options else {
            return Vec::new();
        };
        options
            .iter()
            .enumerate()
            .flat_map(|(index, option)| {
                if !option.has_options() {
                    return vec![vec![index]];
                }
                option
                    .index_permutations()
                    .into_iter()
                    .map(|mut path| {
                        path.insert(0, index);
                        path
                    })
                    .collect()
            })
            .collect()
    }
}
