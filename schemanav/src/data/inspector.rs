use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;

use crate::{
    config::ParseConfig,
    data::column::{Column, SelectionStep},
    details::SchemaDetails,
    error::{Result, SchemaError},
    group::SchemaGroup,
    node::SchemaNode,
    query::{
        create_group_from_schema, create_group_from_schemas, get_array_item_group,
        get_options_in_schema_group, get_properties_from_schema_group,
    },
    scope::RefScope,
};

/// Names the entries exposing the element type of an array.
pub type ArrayItemNamingFn =
    Arc<dyn Fn(&SchemaGroup, Option<&[usize]>) -> BTreeMap<String, SchemaGroup> + Send + Sync>;

/// Name of the single entry representing "one array element".
pub const DEFAULT_ARRAY_ITEM_NAME: &str = "[0]";

/// Navigation state over a set of root schemas.
#[derive(Clone)]
pub struct Inspector {
    roots: BTreeMap<String, SchemaNode>,
    /// Reference-only schemas; targets resolved in them keep all their links.
    ref_schemas: Vec<SchemaNode>,
    array_item_naming: ArrayItemNamingFn,
}

impl Inspector {
    /// Wraps every root and every reference-only schema into its own scope
    /// and links all scopes with each other.
    ///
    /// Reference-only schemas are never offered as roots; they are only
    /// reachable through `$ref`.
    pub fn new(
        roots: impl IntoIterator<Item = (String, Value)>,
        ref_schemas: impl IntoIterator<Item = Value>,
        config: ParseConfig,
    ) -> Self {
        let roots = roots
            .into_iter()
            .map(|(name, schema)| (name, SchemaNode::new(schema, config.clone())))
            .collect::<BTreeMap<_, _>>();
        let ref_schemas = ref_schemas
            .into_iter()
            .map(|schema| SchemaNode::new(schema, config.clone()))
            .collect::<Vec<_>>();

        let scopes = roots
            .values()
            .chain(&ref_schemas)
            .map(|node| node.scope().clone())
            .collect::<Vec<Arc<RefScope>>>();
        for (index, scope) in scopes.iter().enumerate() {
            scope.add_other_scopes(&scopes[index + 1..]);
        }
        debug!(
            "inspector ready: {} root schemas, {} reference schemas",
            roots.len(),
            ref_schemas.len()
        );

        Self {
            roots,
            ref_schemas,
            array_item_naming: Arc::new(|group: &SchemaGroup, _: Option<&[usize]>| {
                BTreeMap::from([(DEFAULT_ARRAY_ITEM_NAME.to_string(), group.clone())])
            }),
        }
    }

    /// Replaces the naming of array element entries.
    pub fn with_array_item_naming(
        mut self,
        naming: impl Fn(&SchemaGroup, Option<&[usize]>) -> BTreeMap<String, SchemaGroup>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.array_item_naming = Arc::new(naming);
        self
    }

    /// Display names of the root schemas, sorted.
    pub fn root_names(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    /// The root schema offered under `name`.
    pub fn root(&self, name: &str) -> Option<&SchemaNode> {
        self.roots.get(name)
    }

    /// Number of reference-only schemas.
    pub fn ref_schema_count(&self) -> usize {
        self.ref_schemas.len()
    }

    /// Every column of `selection`, starting with the column of roots.
    ///
    /// Each step selects in the last column and may open a new one: the
    /// options of a selected item, or the nested items of a selected item
    /// without options or of a selected leaf option.
    pub fn columns(&self, selection: &[SelectionStep]) -> Result<Vec<Column>> {
        let roots = self
            .roots
            .iter()
            .map(|(name, node)| Ok((name.clone(), create_group_from_schema(node)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        let mut columns = Vec::new();
        let mut current = Some(Column::items(roots));
        for step in selection {
            let Some(mut column) = current.take() else {
                return Err(SchemaError::invalid_selection(step, "nothing left to select"));
            };
            current = self.select(&mut column, step)?;
            columns.push(column);
        }
        columns.extend(current);
        Ok(columns)
    }

    fn select(&self, column: &mut Column, step: &SelectionStep) -> Result<Option<Column>> {
        match (column, step) {
            (Column::Items { items, selected }, SelectionStep::Item(name)) => {
                let group = items
                    .get(name)
                    .ok_or_else(|| SchemaError::invalid_selection(step, "no such item"))?;
                *selected = Some(name.clone());

                let options = get_options_in_schema_group(group);
                if options.has_options() {
                    return Ok(Some(Column::Options {
                        options,
                        context: group.clone(),
                        selected: None,
                    }));
                }
                self.items_column(group, None)
            }
            (
                Column::Options {
                    options,
                    context,
                    selected,
                },
                SelectionStep::Options(path),
            ) => {
                if !options.is_leaf_path(path) {
                    return Err(SchemaError::invalid_selection(step, "no such option"));
                }
                *selected = Some(path.clone());
                self.items_column(context, Some(path.as_slice()))
            }
            (Column::Items { .. }, SelectionStep::Options(_)) => Err(
                SchemaError::invalid_selection(step, "expected an item name, not an option"),
            ),
            (Column::Options { .. }, SelectionStep::Item(_)) => Err(
                SchemaError::invalid_selection(step, "expected an option, not an item name"),
            ),
        }
    }

    fn items_column(
        &self,
        group: &SchemaGroup,
        option_index_path: Option<&[usize]>,
    ) -> Result<Option<Column>> {
        let items = self.nested_items(group, option_index_path)?;
        Ok((!items.is_empty()).then(|| Column::items(items)))
    }

    /// Properties of the group plus its array element entries.
    pub fn nested_items(
        &self,
        group: &SchemaGroup,
        option_index_path: Option<&[usize]>,
    ) -> Result<BTreeMap<String, SchemaGroup>> {
        let mut items = BTreeMap::new();
        for (name, schemas) in get_properties_from_schema_group(group, option_index_path)? {
            items.insert(name, create_group_from_schemas(&schemas)?);
        }
        if let Some(element) = get_array_item_group(group, option_index_path)? {
            items.extend((self.array_item_naming)(&element, option_index_path));
        }
        Ok(items)
    }

    /// Details of the last selected item or option, `None` when nothing is
    /// selected.
    pub fn details(&self, selection: &[SelectionStep]) -> Result<Option<SchemaDetails>> {
        let columns = self.columns(selection)?;
        columns
            .iter()
            .rev()
            .find_map(Column::selection)
            .map(|(group, path)| SchemaDetails::from_group(group, path))
            .transpose()
    }
}
