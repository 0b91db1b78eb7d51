//! A raw schema value bound to its reference scope and configuration.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::Value;

use crate::{
    config::ParseConfig,
    error::Result,
    scope::RefScope,
    util::{is_non_empty_object, list_field},
};

/// Optional transformation applied to a raw field value before merging.
pub type MapFn<'a> = &'a dyn Fn(&Value) -> Option<Value>;

/// Property name to every schema declaring it.
///
/// A `true` placeholder (a name that is only listed under `required`) is kept
/// only while no real shape has been declared for that name.
pub type Properties = BTreeMap<String, Vec<SchemaNode>>;

/// One schema value together with the scope its `$ref`s resolve in.
///
/// Nodes are cheap to clone and never mutated. Sub-schemas are wrapped on
/// demand, so a self-referential schema is never expanded up front.
#[derive(Clone)]
pub struct SchemaNode {
    schema: Arc<Value>,
    config: Arc<ParseConfig>,
    scope: Arc<RefScope>,
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaNode {
    /// Wraps a top-level schema, building its own [`RefScope`].
    pub fn new(schema: Value, config: ParseConfig) -> Self {
        let schema = Arc::new(schema);
        let config = Arc::new(config);
        let scope = RefScope::new(schema.clone(), config.clone());
        Self::from_parts(schema, config, scope)
    }

    pub(crate) fn from_parts(
        schema: Arc<Value>,
        config: Arc<ParseConfig>,
        scope: Arc<RefScope>,
    ) -> Self {
        Self {
            schema,
            config,
            scope,
        }
    }

    /// The wrapped raw schema.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Parse configuration of the owning top-level schema.
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Scope `$ref`s of this node resolve in.
    pub fn scope(&self) -> &Arc<RefScope> {
        &self.scope
    }

    /// The `$ref` of this schema, if any.
    pub fn reference(&self) -> Option<&str> {
        self.schema.get("$ref").and_then(Value::as_str)
    }

    /// Whether this node is the `true` placeholder of a merely required
    /// property.
    pub fn is_placeholder(&self) -> bool {
        self.schema.as_bool() == Some(true)
    }

    /// Wraps a sub-schema of this node in the same scope.
    pub fn wrap(&self, schema: &Value) -> SchemaNode {
        Self::from_parts(
            Arc::new(schema.clone()),
            self.config.clone(),
            self.scope.clone(),
        )
    }

    /// The parts listed under a combinator key, or `None` when the key is
    /// missing or not a list.
    pub fn sub_schemas(&self, key: &str) -> Option<Vec<SchemaNode>> {
        list_field(&self.schema, key).map(|parts| parts.iter().map(|part| self.wrap(part)).collect())
    }

    pub(crate) fn same_target(&self, other: &SchemaNode) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
    }

    /// Looks up `field`, following `$ref` and folding in `allOf` parts.
    ///
    /// A `$ref` is exclusive: every sibling key of it is ignored. Otherwise
    /// the own value (passed through `map`) seeds a fold over the values of
    /// all `allOf` parts.
    pub fn get_field_value<M>(
        &self,
        field: &str,
        merge: M,
        map: Option<MapFn<'_>>,
    ) -> Result<Option<Value>>
    where
        M: Fn(Option<Value>, Value) -> Option<Value>,
    {
        self.field_value(field, &merge, map, &mut RefTrail::starting_at(self))
    }

    fn field_value(
        &self,
        field: &str,
        merge: &dyn Fn(Option<Value>, Value) -> Option<Value>,
        map: Option<MapFn<'_>>,
        trail: &mut RefTrail,
    ) -> Result<Option<Value>> {
        if !is_non_empty_object(&self.schema) {
            return Ok(None);
        }
        if let Some(reference) = self.reference() {
            let Some(target) = trail.enter(self, reference)? else {
                return Ok(None);
            };
            let value = target.field_value(field, merge, map, trail)?;
            trail.leave();
            return Ok(value);
        }

        let mut value = self.raw_field_value(field, map);
        for part in self.sub_schemas("allOf").unwrap_or_default() {
            if let Some(part_value) = part.field_value(field, merge, map, trail)? {
                value = merge(value, part_value);
            }
        }
        Ok(value)
    }

    /// The field as written on this very schema, without following anything.
    pub fn raw_field_value(&self, field: &str, map: Option<MapFn<'_>>) -> Option<Value> {
        let raw = self.schema.get(field)?;
        match map {
            Some(map) => map(raw),
            None => Some(raw.clone()),
        }
    }

    /// Schema describing the elements of an array.
    ///
    /// `items` wins when it is a non-empty schema object, then
    /// `additionalItems`. Boolean values and positional `items` lists never
    /// yield a node.
    pub fn get_type_of_array_items(&self) -> Option<SchemaNode> {
        ["items", "additionalItems"]
            .into_iter()
            .filter_map(|key| self.schema.get(key))
            .find(|value| is_non_empty_object(value))
            .map(|value| self.wrap(value))
    }

    /// Schemas that may contribute `properties`/`required` to this node.
    pub fn get_property_parent_schemas(&self) -> Result<Vec<SchemaNode>> {
        self.property_parents(&mut RefTrail::starting_at(self))
    }

    fn property_parents(&self, trail: &mut RefTrail) -> Result<Vec<SchemaNode>> {
        if let Some(reference) = self.reference() {
            let Some(target) = trail.enter(self, reference)? else {
                return Ok(Vec::new());
            };
            let parents = target.property_parents(trail)?;
            trail.leave();
            return Ok(parents);
        }

        let mut parts = self.sub_schemas("allOf").unwrap_or_default();
        parts.extend(self.optional_parts_like_all_of().unwrap_or_default());
        if !parts.is_empty() {
            let mut parents = vec![self.clone()];
            for part in parts {
                parents.extend(part.property_parents(trail)?);
            }
            return Ok(parents);
        }

        match self.get_type_of_array_items() {
            Some(items) => items.property_parents(trail),
            None => Ok(vec![self.clone()]),
        }
    }

    /// `anyOf` parts when `anyOf` is folded in like `allOf`, else the `oneOf`
    /// parts under the same condition.
    fn optional_parts_like_all_of(&self) -> Option<Vec<SchemaNode>> {
        if ParseConfig::is_like_all_of(&self.config.any_of) {
            if let Some(parts) = self.sub_schemas("anyOf") {
                return Some(parts);
            }
        }
        if ParseConfig::is_like_all_of(&self.config.one_of) {
            return self.sub_schemas("oneOf");
        }
        None
    }

    /// Every property declared or required by any property parent schema.
    pub fn get_properties(&self) -> Result<Properties> {
        Ok(self
            .get_property_parent_schemas()?
            .iter()
            .map(SchemaNode::own_properties)
            .fold(Properties::new(), merge_properties))
    }

    /// `properties` of this very schema, plus a `true` placeholder for each
    /// name in `required` without a declared shape.
    pub fn own_properties(&self) -> BTreeMap<String, SchemaNode> {
        let mut properties = BTreeMap::new();
        if let Some(declared) = self.schema.get("properties").and_then(Value::as_object) {
            for (name, schema) in declared {
                properties.insert(name.clone(), self.wrap(schema));
            }
        }
        if let Some(required) = self.schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                properties
                    .entry(name.to_string())
                    .or_insert_with(|| self.wrap(&Value::Bool(true)));
            }
        }
        properties
    }
}

/// Unions two property maps, preferring real shapes over placeholders.
pub fn merge_properties(mut merged: Properties, next: BTreeMap<String, SchemaNode>) -> Properties {
    for (name, node) in next {
        let declared = merged.entry(name).or_default();
        if node.is_placeholder() {
            if declared.is_empty() {
                declared.push(node);
            }
        } else {
            declared.retain(|existing| !existing.is_placeholder());
            declared.push(node);
        }
    }
    merged
}

/// The `$ref` targets currently being expanded by one recursive call.
#[derive(Default)]
pub(crate) struct RefTrail(Vec<SchemaNode>);

impl RefTrail {
    pub(crate) fn starting_at(node: &SchemaNode) -> Self {
        Self(vec![node.clone()])
    }

    /// Resolves `reference` from `node`.
    ///
    /// Returns `None` when the target is already being expanded; the caller
    /// must [`leave`](Self::leave) after handling `Some`.
    pub(crate) fn enter(&mut self, node: &SchemaNode, reference: &str) -> Result<Option<SchemaNode>> {
        let target = node.scope.find(reference)?;
        if self.0.iter().any(|seen| seen.same_target(&target)) {
            debug!("cyclic reference `{reference}` skipped");
            return Ok(None);
        }
        self.0.push(target.clone());
        Ok(Some(target))
    }

    pub(crate) fn leave(&mut self) {
        self.0.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{OptionalsConfig, OptionalsKind},
        error::SchemaError,
        util::{list_values, maximum_value},
    };
    use serde_json::json;

    fn node(schema: Value) -> SchemaNode {
        SchemaNode::new(schema, ParseConfig::default())
    }

    fn like_all_of() -> OptionalsConfig {
        OptionalsConfig::new(OptionalsKind::LikeAllOf)
    }

    #[test]
    fn test_field_value_of_empty_schema() {
        assert_eq!(node(json!({})).get_field_value("title", list_values, None).unwrap(), None);
        assert_eq!(node(json!(true)).get_field_value("title", list_values, None).unwrap(), None);
    }

    #[test]
    fn test_ref_is_exclusive() {
        let root = node(json!({
            "definitions": { "Target": { "title": "target", "minimum": 3 } },
            "properties": {
                "field": { "$ref": "#/definitions/Target", "title": "sibling", "description": "ignored" }
            }
        }));
        let field = root.get_properties().unwrap()["field"][0].clone();
        let target = root.scope().find("#/definitions/Target").unwrap();

        for name in ["title", "description", "minimum"] {
            assert_eq!(
                field.get_field_value(name, list_values, None).unwrap(),
                target.get_field_value(name, list_values, None).unwrap(),
            );
        }
        assert_eq!(
            field.get_field_value("title", list_values, None).unwrap(),
            Some(json!("target"))
        );
    }

    #[test]
    fn test_all_of_maximum() {
        let root = node(json!({ "allOf": [{ "minimum": 1 }, { "minimum": 5 }] }));
        assert_eq!(
            root.get_field_value("minimum", maximum_value, None).unwrap(),
            Some(json!(5))
        );
    }

    #[test]
    fn test_all_of_list_merge_with_map() {
        let root = node(json!({
            "title": "own",
            "allOf": [{ "title": "first" }, { "allOf": [{ "title": "nested" }] }, { "title": "own" }]
        }));
        assert_eq!(
            root.get_field_value("title", list_values, None).unwrap(),
            Some(json!(["own", "first", "nested"]))
        );

        let upper = |value: &Value| value.as_str().map(|s| Value::String(s.to_uppercase()));
        assert_eq!(
            root.get_field_value("title", list_values, Some(&upper)).unwrap(),
            Some(json!(["OWN", "FIRST", "NESTED"]))
        );
    }

    #[test]
    fn test_non_list_all_of_is_ignored() {
        let root = node(json!({ "title": "own", "allOf": { "title": "other" } }));
        assert_eq!(
            root.get_field_value("title", list_values, None).unwrap(),
            Some(json!("own"))
        );
    }

    #[test]
    fn test_unresolved_ref_fails_field_lookup() {
        let root = node(json!({ "allOf": [{ "$ref": "#/definitions/Missing" }] }));
        let err = root.get_field_value("title", list_values, None).unwrap_err();
        assert!(matches!(err, SchemaError::ReferenceNotFound { reference, .. } if reference == "#/definitions/Missing"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let root = node(json!({ "title": "root", "allOf": [{ "$ref": "#" }] }));
        assert_eq!(
            root.get_field_value("title", list_values, None).unwrap(),
            Some(json!("root"))
        );
        let looping = node(json!({
            "definitions": {
                "A": { "$ref": "#/definitions/B" },
                "B": { "$ref": "#/definitions/A" }
            },
            "allOf": [{ "$ref": "#/definitions/A" }]
        }));
        assert_eq!(looping.get_field_value("title", list_values, None).unwrap(), None);
        assert_eq!(looping.get_property_parent_schemas().unwrap().len(), 1);
    }

    #[test]
    fn test_type_of_array_items() {
        let items = node(json!({ "items": { "title": "item" }, "additionalItems": { "title": "extra" } }));
        assert_eq!(items.get_type_of_array_items().unwrap().schema()["title"], "item");

        let tuple = node(json!({ "items": [{ "title": "first" }], "additionalItems": { "title": "extra" } }));
        assert_eq!(tuple.get_type_of_array_items().unwrap().schema()["title"], "extra");

        let boolean = node(json!({ "items": true, "additionalItems": false }));
        assert!(boolean.get_type_of_array_items().is_none());

        assert!(node(json!({ "items": {} })).get_type_of_array_items().is_none());
    }

    #[test]
    fn test_property_parents_follow_ref_and_all_of() {
        let root = node(json!({
            "definitions": { "Base": { "properties": { "base": { "type": "string" } } } },
            "properties": { "own": { "type": "integer" } },
            "allOf": [{ "$ref": "#/definitions/Base" }, { "required": ["extra"] }]
        }));
        assert_eq!(root.get_property_parent_schemas().unwrap().len(), 3);

        let properties = root.get_properties().unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), ["base", "extra", "own"]);
        assert!(properties["extra"][0].is_placeholder());
        assert_eq!(properties["base"][0].schema(), &json!({ "type": "string" }));
    }

    #[test]
    fn test_property_parents_of_array_schema() {
        let root = node(json!({
            "properties": { "ignored": true },
            "items": { "properties": { "element": { "title": "element" } } }
        }));
        let properties = root.get_properties().unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), ["element"]);
    }

    #[test]
    fn test_required_placeholder_yields_to_declared_shape() {
        let root = node(json!({
            "required": ["name"],
            "allOf": [{ "properties": { "name": { "type": "string" } } }]
        }));
        let properties = root.get_properties().unwrap();
        assert_eq!(properties["name"].len(), 1);
        assert_eq!(properties["name"][0].schema(), &json!({ "type": "string" }));
    }

    #[test]
    fn test_optionals_ignored_without_config() {
        let root = node(json!({
            "anyOf": [{ "properties": { "a": true } }],
            "oneOf": [{ "properties": { "b": true } }]
        }));
        assert!(root.get_properties().unwrap().is_empty());
    }

    #[test]
    fn test_any_of_takes_precedence_over_one_of() {
        let schema = json!({
            "anyOf": [{ "properties": { "a": true } }],
            "oneOf": [{ "properties": { "b": true } }]
        });
        let both = SchemaNode::new(
            schema.clone(),
            ParseConfig::default()
                .with_any_of(like_all_of())
                .with_one_of(like_all_of()),
        );
        assert_eq!(both.get_properties().unwrap().keys().collect::<Vec<_>>(), ["a"]);

        let one_of_only = SchemaNode::new(schema, ParseConfig::default().with_one_of(like_all_of()));
        assert_eq!(one_of_only.get_properties().unwrap().keys().collect::<Vec<_>>(), ["b"]);
    }
}
