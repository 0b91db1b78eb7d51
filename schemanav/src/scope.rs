//! `$ref` target registry for one top-level schema.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, Weak},
};

use serde_json::Value;

use crate::{
    config::ParseConfig,
    error::{Result, SchemaError},
    node::SchemaNode,
    util::is_non_empty_object,
};

/// Keys holding named, re-usable sub-schemas.
const DEFINITION_KEYS: [&str; 2] = ["definitions", "$defs"];

/// The immutable target tables of one top-level schema.
///
/// Holds no link to any other scope, so linked scopes can share it strongly
/// without forming a reference cycle.
#[derive(Debug)]
struct RefTargets {
    root: Arc<Value>,
    internal_refs: HashMap<String, Arc<Value>>,
    external_refs: HashMap<String, Arc<Value>>,
    config: Arc<ParseConfig>,
}

impl RefTargets {
    fn collect(schema: Arc<Value>, config: Arc<ParseConfig>) -> Self {
        let mut internal_refs = HashMap::new();
        let mut external_refs = HashMap::new();
        internal_refs.insert("#".to_string(), schema.clone());

        let base = identifier(&schema).map(|id| {
            let with_fragment = format!("{id}#");
            external_refs.insert(id.to_string(), schema.clone());
            external_refs.insert(with_fragment.clone(), schema.clone());
            with_fragment
        });

        for key in DEFINITION_KEYS {
            let Some(definitions) = schema.get(key).and_then(Value::as_object) else {
                continue;
            };
            for (name, definition) in definitions {
                if !is_non_empty_object(definition) {
                    continue;
                }
                let target = Arc::new(definition.clone());
                let path = format!("/{key}/{}", escape_pointer_token(name));
                internal_refs.insert(format!("#{path}"), target.clone());
                if let Some(own_id) = definition
                    .get("$id")
                    .or_else(|| definition.get("id"))
                    .and_then(Value::as_str)
                    .filter(|id| !id.is_empty())
                {
                    internal_refs.insert(own_id.to_string(), target.clone());
                }
                if let Some(base) = &base {
                    external_refs.insert(format!("{base}{path}"), target);
                }
            }
        }

        debug!(
            "scope built: {} internal, {} external targets",
            internal_refs.len(),
            external_refs.len()
        );

        Self {
            root: schema,
            internal_refs,
            external_refs,
            config,
        }
    }

    fn lookup(&self, reference: &str, include_internal: bool) -> Option<&Arc<Value>> {
        include_internal
            .then(|| self.internal_refs.get(reference))
            .flatten()
            .or_else(|| self.external_refs.get(reference))
    }
}

/// A scope linked with another one.
///
/// The targets stay resolvable after the linked scope itself is dropped.
#[derive(Debug, Clone)]
struct LinkedScope {
    targets: Arc<RefTargets>,
    scope: Weak<RefScope>,
}

impl LinkedScope {
    fn of(scope: &Arc<RefScope>) -> Self {
        Self {
            targets: scope.targets.clone(),
            scope: Arc::downgrade(scope),
        }
    }
}

/// Every `$ref` target resolvable from one top-level schema.
///
/// Internal targets (`#`, `#/definitions/<key>`, `#/$defs/<key>` and a
/// definition's own identifier) are only visible to this scope. External
/// targets exist only when the top-level schema declares an identifier and
/// are visible to linked sibling scopes as well.
#[derive(Debug)]
pub struct RefScope {
    targets: Arc<RefTargets>,
    other_scopes: RwLock<Vec<LinkedScope>>,
}

impl RefScope {
    /// Collects the targets of `schema`, which is the top-level schema.
    pub fn new(schema: Arc<Value>, config: Arc<ParseConfig>) -> Arc<Self> {
        Arc::new(Self {
            targets: Arc::new(RefTargets::collect(schema, config)),
            other_scopes: RwLock::new(Vec::new()),
        })
    }

    /// Links `other` with this scope, in both directions.
    pub fn add_other_scope(self: &Arc<Self>, other: &Arc<RefScope>) {
        if Arc::ptr_eq(&self.targets, &other.targets) {
            return;
        }
        self.link(other);
        other.link(self);
        debug!("linked scopes ({} siblings)", self.sibling_count());
    }

    /// Links every scope in `others` with this scope.
    pub fn add_other_scopes<'a>(self: &Arc<Self>, others: impl IntoIterator<Item = &'a Arc<RefScope>>) {
        for other in others {
            self.add_other_scope(other);
        }
    }

    fn link(&self, other: &Arc<RefScope>) {
        let mut scopes = self
            .other_scopes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let known = scopes
            .iter()
            .any(|linked| Arc::ptr_eq(&linked.targets, &other.targets));
        if !known {
            scopes.push(LinkedScope::of(other));
        }
    }

    fn sibling_count(&self) -> usize {
        self.other_scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Configuration shared by every node of this scope.
    pub fn config(&self) -> &Arc<ParseConfig> {
        &self.targets.config
    }

    /// The top-level schema this scope was built from.
    pub fn root(self: &Arc<Self>) -> SchemaNode {
        self.node(self.targets.root.clone())
    }

    fn node(self: &Arc<Self>, schema: Arc<Value>) -> SchemaNode {
        SchemaNode::from_parts(schema, self.targets.config.clone(), self.clone())
    }

    /// Looks `reference` up in this scope only.
    ///
    /// Internal targets are consulted first unless `include_internal` is
    /// `false`, in which case only external targets are visible.
    pub fn find_in_own_scope(
        self: &Arc<Self>,
        reference: &str,
        include_internal: bool,
    ) -> Option<SchemaNode> {
        let target = self.targets.lookup(reference, include_internal)?;
        Some(self.node(target.clone()))
    }

    /// Resolves `reference` in this scope, then in the external targets of
    /// every linked scope.
    ///
    /// A node found in a linked scope belongs to that scope. When the linked
    /// scope has been dropped meanwhile, it belongs to a scope rebuilt from
    /// the retained targets and linked back to this one.
    pub fn find(self: &Arc<Self>, reference: &str) -> Result<SchemaNode> {
        if let Some(node) = self.find_in_own_scope(reference, true) {
            return Ok(node);
        }
        let siblings = self
            .other_scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for linked in siblings {
            let Some(target) = linked.targets.lookup(reference, false) else {
                continue;
            };
            debug!("resolved `{reference}` through a linked scope");
            let scope = match linked.scope.upgrade() {
                Some(scope) => scope,
                None => self.detached(&linked),
            };
            return Ok(scope.node(target.clone()));
        }
        Err(SchemaError::ReferenceNotFound {
            reference: reference.to_string(),
            known: self.known_targets(),
        })
    }

    fn detached(self: &Arc<Self>, linked: &LinkedScope) -> Arc<RefScope> {
        debug!("linked scope dropped, resolving through its retained targets");
        Arc::new(Self {
            targets: linked.targets.clone(),
            other_scopes: RwLock::new(vec![LinkedScope::of(self)]),
        })
    }

    /// All targets registered in this scope, sorted.
    pub fn known_targets(&self) -> Vec<String> {
        let mut known = self
            .targets
            .internal_refs
            .keys()
            .chain(self.targets.external_refs.keys())
            .cloned()
            .collect::<Vec<_>>();
        known.sort();
        known
    }
}

/// The identifier of a top-level schema without its fragment.
fn identifier(schema: &Value) -> Option<&str> {
    schema
        .get("$id")
        .or_else(|| schema.get("id"))
        .and_then(Value::as_str)
        .map(|id| id.split_once('#').map_or(id, |(base, _)| base))
        .filter(|id| !id.is_empty())
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
