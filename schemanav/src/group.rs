//! Combinator algebra.
//!
//! A [`SchemaGroup`] models `allOf` (conjunction) or one of the optional
//! combinators `anyOf`/`oneOf`. Groups are built once by
//! [`create_group_from_schema`](crate::create_group_from_schema) and only
//! read afterwards.
//!
//! ## Transparency
//!
//! A group is *transparent* when its entries are walked as if they were
//! inlined into the parent. Only non-transparent groups surface options: each
//! of their direct entries is one option, addressed by its position.
//! An option-index path selects one entry per non-transparent group, from the
//! outermost group inwards.

use std::fmt;

use crate::{
    config::{OptionNameFn, OptionalsConfig},
    error::Result,
    node::SchemaNode,
    options::OptionsTree,
};

/// One member of a group.
#[derive(Debug, Clone)]
pub enum GroupEntry {
    /// A single schema.
    Schema(SchemaNode),
    /// A nested combinator.
    Group(SchemaGroup),
}

impl GroupEntry {
    /// Whether this entry surfaces any option at any depth.
    pub fn contains_options(&self) -> bool {
        match self {
            GroupEntry::Schema(_) => false,
            GroupEntry::Group(group) => group.contains_options(),
        }
    }
}

impl From<SchemaNode> for GroupEntry {
    fn from(node: SchemaNode) -> Self {
        GroupEntry::Schema(node)
    }
}

impl From<SchemaGroup> for GroupEntry {
    fn from(group: SchemaGroup) -> Self {
        GroupEntry::Group(group)
    }
}

/// Presentation settings of an `anyOf`/`oneOf` group.
#[derive(Clone)]
pub struct OptionalsSettings {
    /// Title shown above the options.
    pub group_title: String,
    /// Custom option naming.
    pub option_name_for_index: Option<OptionNameFn>,
    /// Whether every entry is an option of its own.
    pub treat_as_separate_options: bool,
}

impl fmt::Debug for OptionalsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalsSettings")
            .field("group_title", &self.group_title)
            .field("treat_as_separate_options", &self.treat_as_separate_options)
            .finish_non_exhaustive()
    }
}

impl OptionalsSettings {
    fn from_config(config: &OptionalsConfig, default_title: &str) -> Self {
        Self {
            group_title: config
                .group_title
                .clone()
                .unwrap_or_else(|| default_title.to_string()),
            option_name_for_index: config.option_name_for_index.clone(),
            treat_as_separate_options: config.treat_as_separate_options(),
        }
    }
}

/// The closed set of group variants.
#[derive(Debug, Clone)]
pub enum GroupKind {
    /// `allOf`: every entry applies.
    AllOf,
    /// `anyOf`: entries are alternatives.
    AnyOf(OptionalsSettings),
    /// `oneOf`: entries are alternatives.
    OneOf(OptionalsSettings),
}

/// Remaining position of one traversal in an option-index path.
///
/// A fresh target is created for every query; selecting an option yields a
/// new target for the selected entry instead of mutating this one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionTarget<'a> {
    remaining: &'a [usize],
    narrowed: bool,
}

impl<'a> OptionTarget<'a> {
    /// Traverse every option.
    pub fn full() -> Self {
        Self::default()
    }

    /// Traverse the options selected by `path`, outermost first.
    pub fn new(path: &'a [usize]) -> Self {
        Self {
            remaining: path,
            narrowed: false,
        }
    }

    /// [`new`](Self::new) for an optional path, [`full`](Self::full) otherwise.
    pub fn from_path(path: Option<&'a [usize]>) -> Self {
        path.map(Self::new).unwrap_or_default()
    }

    /// Indexes not yet consumed by a non-transparent group.
    pub fn remaining(&self) -> &'a [usize] {
        self.remaining
    }

    /// `true` while no option has been selected and none is pending.
    pub fn is_full_traversal(&self) -> bool {
        !self.narrowed && self.remaining.is_empty()
    }

    fn select(self) -> Option<(usize, OptionTarget<'a>)> {
        let (&index, rest) = self.remaining.split_first()?;
        Some((
            index,
            OptionTarget {
                remaining: rest,
                narrowed: true,
            },
        ))
    }
}

/// An ordered list of schemas and nested groups.
#[derive(Debug, Clone)]
pub struct SchemaGroup {
    kind: GroupKind,
    entries: Vec<GroupEntry>,
    /// Number of entries containing options, kept up to date by `with`.
    entries_with_options: usize,
}

impl Default for SchemaGroup {
    fn default() -> Self {
        Self::all_of()
    }
}

impl SchemaGroup {
    /// An empty conjunction.
    pub fn all_of() -> Self {
        Self::empty(GroupKind::AllOf)
    }

    /// An empty `anyOf` group (default title `"any of"`).
    pub fn any_of(config: &OptionalsConfig) -> Self {
        Self::empty(GroupKind::AnyOf(OptionalsSettings::from_config(config, "any of")))
    }

    /// An empty `oneOf` group (default title `"one of"`).
    pub fn one_of(config: &OptionalsConfig) -> Self {
        Self::empty(GroupKind::OneOf(OptionalsSettings::from_config(config, "one of")))
    }

    fn empty(kind: GroupKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            entries_with_options: 0,
        }
    }

    /// The variant of this group.
    pub fn kind(&self) -> &GroupKind {
        &self.kind
    }

    /// Direct entries, in order.
    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    /// `true` when the group has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Settings of an optional group, `None` for a conjunction.
    pub fn optionals(&self) -> Option<&OptionalsSettings> {
        match &self.kind {
            GroupKind::AllOf => None,
            GroupKind::AnyOf(settings) | GroupKind::OneOf(settings) => Some(settings),
        }
    }

    /// Whether every entry is an option of its own.
    pub fn considers_schemas_as_separate_options(&self) -> bool {
        self.optionals()
            .is_some_and(|settings| settings.treat_as_separate_options)
    }

    /// Whether entries are walked as one, i.e. the group is transparent.
    ///
    /// Groups with fewer than two entries are always transparent. Otherwise a
    /// group surfacing its entries as options never is; any other group
    /// stays transparent while at most one entry contains options.
    pub fn should_treat_entries_as_one(&self) -> bool {
        if self.entries.len() < 2 {
            return true;
        }
        if self.considers_schemas_as_separate_options() {
            return false;
        }
        self.entries_with_options < 2
    }

    /// Whether this group or any nested group surfaces options.
    pub fn contains_options(&self) -> bool {
        self.entries_with_options > 0 || !self.should_treat_entries_as_one()
    }

    /// Appends an entry.
    ///
    /// A group with exactly one entry is replaced by that entry first. A
    /// conjunction absorbs the entries of a nested conjunction, so conjunctions
    /// never nest directly.
    pub fn with(mut self, entry: impl Into<GroupEntry>) -> Self {
        match unwrap_singletons(entry.into()) {
            GroupEntry::Group(inner)
                if matches!(self.kind, GroupKind::AllOf)
                    && matches!(inner.kind, GroupKind::AllOf) =>
            {
                self.entries_with_options += inner.entries_with_options;
                self.entries.extend(inner.entries);
            }
            entry => {
                if entry.contains_options() {
                    self.entries_with_options += 1;
                }
                self.entries.push(entry);
            }
        }
        self
    }

    /// Depth-first search for a schema matching `predicate`.
    ///
    /// The predicate receives each visited schema and whether the traversal
    /// is still a full one. In a non-transparent group only the entry selected
    /// by `target` is visited among the option candidates (every entry for
    /// separate-option groups, nested groups otherwise); plain schemas of a
    /// non-separate group always apply. Without a pending index every entry
    /// is visited. Stops at the first `true`.
    pub fn some_entry<F>(&self, mut predicate: F, target: OptionTarget<'_>) -> Result<bool>
    where
        F: FnMut(&SchemaNode, bool) -> Result<bool>,
    {
        self.visit(&mut predicate, target)
    }

    fn visit(
        &self,
        predicate: &mut dyn FnMut(&SchemaNode, bool) -> Result<bool>,
        target: OptionTarget<'_>,
    ) -> Result<bool> {
        let selection = if self.should_treat_entries_as_one() {
            None
        } else {
            target.select()
        };
        let Some((index, selected_target)) = selection else {
            for entry in &self.entries {
                if visit_entry(entry, predicate, target)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        };

        trace!("option {index} of {} selected", self.entries.len());
        let separate = self.considers_schemas_as_separate_options();
        for (position, entry) in self.entries.iter().enumerate() {
            let is_candidate = separate || matches!(entry, GroupEntry::Group(_));
            if is_candidate && position != index {
                continue;
            }
            if visit_entry(entry, predicate, selected_target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Collects `extract` over every visited schema and folds the found
    /// values with `merge`, starting from `seed`.
    pub fn extract_values<T, A, E, M>(
        &self,
        mut extract: E,
        merge: M,
        seed: A,
        target: OptionTarget<'_>,
    ) -> Result<A>
    where
        E: FnMut(&SchemaNode) -> Result<Option<T>>,
        M: FnMut(A, T) -> A,
    {
        let mut found = Vec::new();
        self.some_entry(
            |node, _| {
                if let Some(value) = extract(node)? {
                    found.push(value);
                }
                Ok(false)
            },
            target,
        )?;
        Ok(found.into_iter().fold(seed, merge))
    }

    /// Combines the options of contained entries into this group's options.
    ///
    /// No options collapse to an empty tree and a single one is passed
    /// through unchanged. Several become the options of this group, carrying
    /// its title and naming for optional groups.
    pub fn create_options_representation(&self, mut contained: Vec<OptionsTree>) -> OptionsTree {
        if contained.len() < 2 {
            return contained.pop().unwrap_or_default();
        }
        let mut tree = OptionsTree::with_options(contained);
        if let Some(settings) = self.optionals() {
            tree.group_title = Some(settings.group_title.clone());
            tree.option_name_for_index = settings.option_name_for_index.clone();
        }
        tree
    }
}

fn unwrap_singletons(entry: GroupEntry) -> GroupEntry {
    match entry {
        GroupEntry::Group(mut group) if group.entries.len() == 1 => match group.entries.pop() {
            Some(inner) => unwrap_singletons(inner),
            None => GroupEntry::Group(group),
        },
        entry => entry,
    }
}

fn visit_entry(
    entry: &GroupEntry,
    predicate: &mut dyn FnMut(&SchemaNode, bool) -> Result<bool>,
    target: OptionTarget<'_>,
) -> Result<bool> {
    match entry {
        GroupEntry::Schema(node) => predicate(node, target.is_full_traversal()),
        GroupEntry::Group(group) => group.visit(predicate, target),
    }
}
