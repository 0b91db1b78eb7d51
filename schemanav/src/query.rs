//! Group construction and the queries built on top of it.
//!
//! Every query taking an option-index path creates its own
//! [`OptionTarget`]; `None` traverses all options.

use serde_json::Value;

use crate::{
    error::Result,
    group::{GroupEntry, OptionTarget, SchemaGroup},
    node::{MapFn, Properties, RefTrail, SchemaNode, merge_properties},
    options::OptionsTree,
    util::is_non_empty_object,
};

/// Builds the group tree of `node`.
///
/// Empty and boolean schemas yield an empty conjunction. A `$ref` is
/// followed exclusively. Otherwise the conjunction holds the node itself,
/// its `allOf` parts and, when enabled in the node's configuration, an
/// `anyOf`/`oneOf` group of the respective parts. Every part is built through
/// this same function, so references and combinators inside branches are
/// honored. A reference back to a target that is already being expanded
/// contributes nothing.
pub fn create_group_from_schema(node: &SchemaNode) -> Result<SchemaGroup> {
    build_group(node, &mut RefTrail::starting_at(node))
}

fn build_group(node: &SchemaNode, trail: &mut RefTrail) -> Result<SchemaGroup> {
    if !is_non_empty_object(node.schema()) {
        return Ok(SchemaGroup::all_of());
    }
    if let Some(reference) = node.reference() {
        let Some(target) = trail.enter(node, reference)? else {
            return Ok(SchemaGroup::all_of());
        };
        let group = build_group(&target, trail)?;
        trail.leave();
        return Ok(group);
    }

    let mut group = SchemaGroup::all_of().with(node.clone());
    if let Some(parts) = node.sub_schemas("allOf") {
        group = with_parts(group, SchemaGroup::all_of(), &parts, trail)?;
    }
    let config = node.config();
    if let (Some(parts), Some(any_of)) = (node.sub_schemas("anyOf"), &config.any_of) {
        group = with_parts(group, SchemaGroup::any_of(any_of), &parts, trail)?;
    }
    if let (Some(parts), Some(one_of)) = (node.sub_schemas("oneOf"), &config.one_of) {
        group = with_parts(group, SchemaGroup::one_of(one_of), &parts, trail)?;
    }
    Ok(group)
}

fn with_parts(
    group: SchemaGroup,
    mut combined: SchemaGroup,
    parts: &[SchemaNode],
    trail: &mut RefTrail,
) -> Result<SchemaGroup> {
    for part in parts {
        combined = combined.with(build_group(part, trail)?);
    }
    Ok(if combined.is_empty() {
        group
    } else {
        group.with(combined)
    })
}

/// Conjunction of the groups of all `nodes`, e.g. every schema declaring the
/// same property.
pub fn create_group_from_schemas(nodes: &[SchemaNode]) -> Result<SchemaGroup> {
    nodes.iter().try_fold(SchemaGroup::all_of(), |group, node| {
        Ok(group.with(create_group_from_schema(node)?))
    })
}

/// Properties declared or required anywhere in the (selected part of the)
/// group.
pub fn get_properties_from_schema_group(
    group: &SchemaGroup,
    option_index_path: Option<&[usize]>,
) -> Result<Properties> {
    group.extract_values(
        |node| {
            let properties = node.own_properties();
            Ok((!properties.is_empty()).then_some(properties))
        },
        merge_properties,
        Properties::new(),
        OptionTarget::from_path(option_index_path),
    )
}

/// Group-wide field lookup: the raw `field` of every visited schema, passed
/// through `map`, folded with `merge` starting from `seed`.
pub fn get_field_value_from_schema_group<M>(
    group: &SchemaGroup,
    field: &str,
    merge: M,
    seed: Option<Value>,
    map: Option<MapFn<'_>>,
    option_index_path: Option<&[usize]>,
) -> Result<Option<Value>>
where
    M: Fn(Option<Value>, Value) -> Option<Value>,
{
    group.extract_values(
        |node| Ok(node.raw_field_value(field, map)),
        merge,
        seed,
        OptionTarget::from_path(option_index_path),
    )
}

/// Schema of the array elements described by the group.
///
/// `items` is looked for first, then `additionalItems`; each attempt walks
/// the group with a fresh option target. When several schemas are found the
/// first one wins.
pub fn get_type_of_array_items_from_schema_group(
    group: &SchemaGroup,
    option_index_path: Option<&[usize]>,
) -> Result<Option<SchemaNode>> {
    for key in ["items", "additionalItems"] {
        let found = group.extract_values(
            |node| {
                Ok(node
                    .schema()
                    .get(key)
                    .filter(|value| is_non_empty_object(value))
                    .map(|value| node.wrap(value)))
            },
            |mut found: Vec<SchemaNode>, node| {
                found.push(node);
                found
            },
            Vec::new(),
            OptionTarget::from_path(option_index_path),
        )?;
        if found.len() > 1 {
            debug!("{} `{key}` schemas found, using the first", found.len());
        }
        if let Some(first) = found.into_iter().next() {
            return Ok(Some(first));
        }
    }
    Ok(None)
}

/// Group of the array elements described by the group, if any.
pub fn get_array_item_group(
    group: &SchemaGroup,
    option_index_path: Option<&[usize]>,
) -> Result<Option<SchemaGroup>> {
    get_type_of_array_items_from_schema_group(group, option_index_path)?
        .map(|items| create_group_from_schema(&items))
        .transpose()
}

/// Options offered by the group.
///
/// A transparent group passes on the options of its nested groups; a
/// non-transparent one offers each direct entry as an option.
pub fn get_options_in_schema_group(group: &SchemaGroup) -> OptionsTree {
    let contained = if group.should_treat_entries_as_one() {
        group
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                GroupEntry::Group(nested) => Some(get_options_in_schema_group(nested)),
                GroupEntry::Schema(_) => None,
            })
            .filter(OptionsTree::has_options)
            .collect()
    } else {
        group
            .entries()
            .iter()
            .map(|entry| match entry {
                GroupEntry::Group(nested) => get_options_in_schema_group(nested),
                GroupEntry::Schema(_) => OptionsTree::default(),
            })
            .collect()
    };
    group.create_options_representation(contained)
}

/// Every leaf option-index path of an options tree.
pub fn get_index_permutations_for_options(options: &OptionsTree) -> Vec<Vec<usize>> {
    options.index_permutations()
}

/// Whether any visited schema satisfies `predicate`.
pub fn schema_group_contains<F>(
    group: &SchemaGroup,
    predicate: F,
    option_index_path: Option<&[usize]>,
) -> Result<bool>
where
    F: FnMut(&SchemaNode, bool) -> Result<bool>,
{
    group.some_entry(predicate, OptionTarget::from_path(option_index_path))
}

/// Whether the group offers anything to navigate into: properties or an
/// array element type.
pub fn has_nested_items(group: &SchemaGroup, option_index_path: Option<&[usize]>) -> Result<bool> {
    Ok(!get_properties_from_schema_group(group, option_index_path)?.is_empty()
        || get_type_of_array_items_from_schema_group(group, option_index_path)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{OptionalsConfig, OptionalsKind, ParseConfig},
        error::SchemaError,
        util::{list_values, maximum_value},
    };
    use serde_json::json;

    fn separate() -> OptionalsConfig {
        OptionalsConfig::new(OptionalsKind::AsAdditionalColumn)
    }

    fn columns_config() -> ParseConfig {
        ParseConfig::default()
            .with_any_of(separate())
            .with_one_of(separate())
    }

    fn group_of(schema: Value, config: ParseConfig) -> SchemaGroup {
        create_group_from_schema(&SchemaNode::new(schema, config)).unwrap()
    }

    fn title(group: &SchemaGroup, path: Option<&[usize]>) -> Option<Value> {
        get_field_value_from_schema_group(group, "title", list_values, None, None, path).unwrap()
    }

    #[test]
    fn test_empty_schema_group() {
        assert!(group_of(json!(true), ParseConfig::default()).is_empty());
        assert!(group_of(json!({}), ParseConfig::default()).is_empty());
    }

    #[test]
    fn test_ref_is_exclusive_in_groups() {
        let root = SchemaNode::new(
            json!({
                "definitions": { "T": { "title": "target", "allOf": [{ "description": "d" }] } },
                "properties": { "p": { "$ref": "#/definitions/T", "title": "sibling" } }
            }),
            ParseConfig::default(),
        );
        let property = root.get_properties().unwrap()["p"][0].clone();
        let via_ref = create_group_from_schema(&property).unwrap();
        let direct =
            create_group_from_schema(&root.scope().find("#/definitions/T").unwrap()).unwrap();

        assert_eq!(title(&via_ref, None), Some(json!("target")));
        assert_eq!(via_ref.entries().len(), direct.entries().len());
        for field in ["title", "description"] {
            assert_eq!(
                get_field_value_from_schema_group(&via_ref, field, list_values, None, None, None)
                    .unwrap(),
                get_field_value_from_schema_group(&direct, field, list_values, None, None, None)
                    .unwrap(),
            );
        }
    }

    #[test]
    fn test_all_of_maximum_over_group() {
        let group = group_of(
            json!({ "allOf": [{ "minimum": 1 }, { "minimum": 5 }] }),
            ParseConfig::default(),
        );
        let minimum =
            get_field_value_from_schema_group(&group, "minimum", maximum_value, None, None, None)
                .unwrap();
        assert_eq!(minimum, Some(json!(5)));
    }

    #[test]
    fn test_unconfigured_combinators_are_ignored() {
        let group = group_of(
            json!({ "title": "root", "anyOf": [{ "title": "a" }], "oneOf": [{ "title": "b" }, { "title": "c" }] }),
            ParseConfig::default(),
        );
        assert_eq!(group.entries().len(), 1);
        assert_eq!(title(&group, None), Some(json!("root")));
        assert!(!get_options_in_schema_group(&group).has_options());
    }

    #[test]
    fn test_one_of_as_additional_column() {
        let group = group_of(
            json!({ "oneOf": [{ "title": "A" }, { "title": "B" }] }),
            ParseConfig::default().with_one_of(separate()),
        );
        let options = get_options_in_schema_group(&group);
        assert_eq!(
            options,
            OptionsTree {
                options: Some(vec![OptionsTree::default(), OptionsTree::default()]),
                group_title: Some("one of".to_string()),
                option_name_for_index: None,
            }
        );
        assert_eq!(title(&group, Some(&[1])), Some(json!("B")));
        assert_eq!(title(&group, Some(&[0])), Some(json!("A")));
        assert_eq!(title(&group, None), Some(json!(["A", "B"])));
    }

    #[test]
    fn test_two_any_of_branches_give_two_options() {
        let schema = json!({
            "anyOf": [
                { "properties": { "a": { "type": "string" } } },
                { "properties": { "b": { "type": "number" } } }
            ]
        });
        let separate_group = group_of(schema.clone(), ParseConfig::default().with_any_of(separate()));
        let options = get_options_in_schema_group(&separate_group);
        assert_eq!(options.options.as_ref().map(Vec::len), Some(2));
        assert_eq!(options.group_title.as_deref(), Some("any of"));

        let folded = group_of(
            schema,
            ParseConfig::default().with_any_of(OptionalsConfig::new(OptionalsKind::LikeAllOf)),
        );
        assert!(folded.should_treat_entries_as_one());
        assert_eq!(get_options_in_schema_group(&folded), OptionsTree::default());
        let properties = get_properties_from_schema_group(&folded, None).unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_properties_of_selected_option() {
        let group = group_of(
            json!({
                "properties": { "shared": { "type": "string" } },
                "required": ["flag"],
                "oneOf": [
                    { "properties": { "first": true } },
                    { "properties": { "flag": { "type": "boolean" } }, "required": ["second"] }
                ]
            }),
            columns_config(),
        );
        let first = get_properties_from_schema_group(&group, Some(&[0])).unwrap();
        assert_eq!(first.keys().collect::<Vec<_>>(), ["first", "flag", "shared"]);
        assert!(first["flag"][0].is_placeholder());

        let second = get_properties_from_schema_group(&group, Some(&[1])).unwrap();
        assert_eq!(second.keys().collect::<Vec<_>>(), ["flag", "second", "shared"]);
        assert_eq!(second["flag"].len(), 1);
        assert_eq!(second["flag"][0].schema(), &json!({ "type": "boolean" }));

        let all = get_properties_from_schema_group(&group, None).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_refs_inside_branches_are_resolved() {
        let group = group_of(
            json!({
                "definitions": {
                    "Cat": { "title": "cat", "properties": { "meow": true } },
                    "Dog": { "title": "dog", "oneOf": [{ "title": "small" }, { "title": "large" }] }
                },
                "oneOf": [{ "$ref": "#/definitions/Cat" }, { "$ref": "#/definitions/Dog" }]
            }),
            columns_config(),
        );
        let options = get_options_in_schema_group(&group);
        assert_eq!(
            get_index_permutations_for_options(&options),
            vec![vec![0], vec![1, 0], vec![1, 1]]
        );
        assert_eq!(title(&group, Some(&[1, 1])), Some(json!(["dog", "large"])));
        assert_eq!(title(&group, Some(&[0])), Some(json!("cat")));
    }

    #[test]
    fn test_cyclic_combinator_terminates() {
        let group = group_of(
            json!({
                "definitions": {
                    "Node": { "title": "node", "anyOf": [{ "$ref": "#/definitions/Node" }, { "title": "leaf" }] }
                },
                "$ref": "#/definitions/Node"
            }),
            columns_config(),
        );
        let options = get_options_in_schema_group(&group);
        assert_eq!(options.options.as_ref().map(Vec::len), Some(2));
        assert_eq!(title(&group, Some(&[1])), Some(json!(["node", "leaf"])));
    }

    #[test]
    fn test_array_item_type_retry_uses_fresh_target() {
        let group = group_of(
            json!({
                "oneOf": [
                    { "title": "zero" },
                    { "title": "one" },
                    { "anyOf": [
                        { "items": { "title": "wrong" } },
                        { "additionalItems": { "title": "right" } }
                    ] }
                ]
            }),
            columns_config(),
        );
        assert!(
            get_type_of_array_items_from_schema_group(&group, Some(&[0]))
                .unwrap()
                .is_none()
        );
        let right = get_type_of_array_items_from_schema_group(&group, Some(&[2, 1]))
            .unwrap()
            .unwrap();
        assert_eq!(right.schema()["title"], "right");
        let wrong = get_type_of_array_items_from_schema_group(&group, Some(&[2, 0]))
            .unwrap()
            .unwrap();
        assert_eq!(wrong.schema()["title"], "wrong");
    }

    #[test]
    fn test_array_item_type_prefers_items_and_first_match() {
        let group = group_of(
            json!({
                "additionalItems": { "title": "extra" },
                "allOf": [{ "items": { "title": "first" } }, { "items": { "title": "second" } }]
            }),
            ParseConfig::default(),
        );
        let items = get_type_of_array_items_from_schema_group(&group, None)
            .unwrap()
            .unwrap();
        assert_eq!(items.schema()["title"], "first");

        let tuple = group_of(
            json!({ "items": [{ "title": "a" }], "additionalItems": { "title": "rest" } }),
            ParseConfig::default(),
        );
        let items = get_type_of_array_items_from_schema_group(&tuple, None)
            .unwrap()
            .unwrap();
        assert_eq!(items.schema()["title"], "rest");
    }

    #[test]
    fn test_unresolved_item_reference() {
        let group = group_of(
            json!({ "definitions": { "X": { "title": "x" } }, "items": { "$ref": "#/definitions/Y" } }),
            ParseConfig::default(),
        );
        let err = get_array_item_group(&group, None).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ReferenceNotFound { ref reference, .. } if reference == "#/definitions/Y"
        ));
    }

    #[test]
    fn test_group_from_several_schemas() {
        let root = SchemaNode::new(
            json!({
                "allOf": [
                    { "properties": { "name": { "minLength": 2 } } },
                    { "properties": { "name": { "minLength": 4, "title": "name" } } }
                ]
            }),
            ParseConfig::default(),
        );
        let properties = root.get_properties().unwrap();
        let name = create_group_from_schemas(&properties["name"]).unwrap();
        assert_eq!(name.entries().len(), 2);
        assert_eq!(
            get_field_value_from_schema_group(&name, "minLength", maximum_value, None, None, None)
                .unwrap(),
            Some(json!(4))
        );
        assert!(create_group_from_schemas(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_contains_and_nested_items() {
        let group = group_of(
            json!({ "oneOf": [{ "type": "string" }, { "type": "array", "items": { "type": "integer" } }] }),
            columns_config(),
        );
        let is_array =
            |node: &SchemaNode, _: bool| -> Result<bool> { Ok(node.schema()["type"] == "array") };
        assert!(schema_group_contains(&group, is_array, None).unwrap());
        assert!(!schema_group_contains(&group, is_array, Some(&[0])).unwrap());
        assert!(has_nested_items(&group, Some(&[1])).unwrap());
        assert!(!has_nested_items(&group, Some(&[0])).unwrap());
    }

    #[test]
    fn test_group_of_property_from_dropped_document() {
        let root = SchemaNode::new(
            json!({ "properties": { "a": { "$ref": "Shared#/definitions/A" } } }),
            ParseConfig::default(),
        );
        let shared = SchemaNode::new(
            json!({ "$id": "Shared", "definitions": { "A": { "title": "shared a" } } }),
            ParseConfig::default(),
        );
        root.scope().add_other_scope(shared.scope());
        let properties = root.get_properties().unwrap();
        drop(shared);

        let group = create_group_from_schemas(&properties["a"]).unwrap();
        assert_eq!(title(&group, None), Some(json!("shared a")));
    }
}
