use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{error::SchemaError, group::SchemaGroup, options::OptionsTree};

/// One step of a selection path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStep {
    /// Select an item (property, array element or root) by name.
    Item(String),
    /// Select an option by its option-index path.
    Options(Vec<usize>),
}

impl fmt::Display for SelectionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionStep::Item(name) => write!(f, "{name}"),
            SelectionStep::Options(path) => {
                let indexes = path.iter().map(usize::to_string).collect::<Vec<_>>();
                write!(f, "@{}", indexes.join("."))
            }
        }
    }
}

impl FromStr for SelectionStep {
    type Err = SchemaError;

    /// `@1.0` selects the option path `[1, 0]`; anything else names an item.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(path) = s.strip_prefix('@') else {
            return Ok(SelectionStep::Item(s.to_string()));
        };
        path.split('.')
            .map(|index| {
                index.parse::<usize>().map_err(|_| {
                    SchemaError::invalid_selection(s, format!("`{index}` is not an option index"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SelectionStep::Options)
    }
}

/// One column of a selection, as shown by a rendering layer.
#[derive(Debug, Clone)]
pub enum Column {
    /// Named items to choose from.
    Items {
        /// Item name to its group.
        items: BTreeMap<String, SchemaGroup>,
        /// Name of the selected item.
        selected: Option<String>,
    },
    /// Options of the group selected in the previous column.
    Options {
        /// Options to choose from.
        options: OptionsTree,
        /// Group the options belong to.
        context: SchemaGroup,
        /// Option-index path of the selected option.
        selected: Option<Vec<usize>>,
    },
}

impl Column {
    pub(crate) fn items(items: BTreeMap<String, SchemaGroup>) -> Self {
        Column::Items {
            items,
            selected: None,
        }
    }

    /// The step that made the selection in this column.
    pub fn selected_step(&self) -> Option<SelectionStep> {
        match self {
            Column::Items { selected, .. } => selected.clone().map(SelectionStep::Item),
            Column::Options { selected, .. } => selected.clone().map(SelectionStep::Options),
        }
    }

    /// The selected group and its option-index path, if anything is
    /// selected.
    pub fn selection(&self) -> Option<(&SchemaGroup, Option<&[usize]>)> {
        match self {
            Column::Items { items, selected } => {
                selected.as_ref().and_then(|name| items.get(name)).map(|group| (group, None))
            }
            Column::Options {
                context, selected, ..
            } => selected
                .as_deref()
                .map(|path| (context, Some(path))),
        }
    }
}
