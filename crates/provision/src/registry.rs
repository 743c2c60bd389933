//! Output registry.
//!
//! Stores each node's generated identifiers for consumption by dependents
//! and by the operator. Writes happen only from the provisioner and are
//! write-once per key: re-recording an identical value is a no-op, a
//! differing value is a defect because outputs must be idempotent.

use crate::error::{Error, Result};
use crate::node::{AttrValue, ResourceNode};
use std::collections::{BTreeMap, HashMap};

/// Generated outputs of the nodes that reached Ready.
#[derive(Debug, Default)]
pub struct OutputRegistry {
    entries: HashMap<String, BTreeMap<String, String>>,
}

impl OutputRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a node's outputs have been recorded.
    pub fn contains(&self, node: &str) -> bool {
        self.entries.contains_key(node)
    }

    /// Read one output value of a Ready node.
    pub fn get(&self, node: &str, key: &str) -> Result<&str> {
        let outputs = self.entries.get(node).ok_or_else(|| Error::NotReady {
            node: node.to_string(),
        })?;
        outputs
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingOutput {
                node: node.to_string(),
                key: key.to_string(),
            })
    }

    /// All outputs of a node, if recorded.
    pub fn outputs_of(&self, node: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.get(node)
    }

    /// Record a node's outputs.
    ///
    /// Keys already present must carry the same value; a divergent value is
    /// an [`Error::OutputConflict`] defect. New keys are merged in.
    pub fn record(&mut self, node: &str, outputs: &BTreeMap<String, String>) -> Result<()> {
        let entry = self.entries.entry(node.to_string()).or_default();
        for (key, value) in outputs {
            match entry.get(key) {
                Some(existing) if existing != value => {
                    return Err(Error::OutputConflict {
                        node: node.to_string(),
                        key: key.clone(),
                        existing: existing.clone(),
                        requested: value.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    entry.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Drop a node's outputs after its Destroyed transition.
    pub fn forget(&mut self, node: &str) {
        self.entries.remove(node);
    }

    /// Resolve a node's declared attributes into literal values.
    ///
    /// Every reference must name a recorded node and key; a miss here means
    /// the plan order was violated and is reported as a defect, not retried.
    pub fn resolve(&self, node: &ResourceNode) -> Result<BTreeMap<String, String>> {
        let mut resolved = BTreeMap::new();
        for (key, value) in &node.attributes {
            let literal = match value {
                AttrValue::Literal(v) => v.clone(),
                AttrValue::Ref { node: target, output } => {
                    self.get(target, output)?.to_string()
                }
            };
            resolved.insert(key.clone(), literal);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, ResourceNode};

    fn outputs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn get_before_ready_fails_not_ready() {
        let registry = OutputRegistry::new();
        assert!(matches!(
            registry.get("ContactsTable", "name"),
            Err(Error::NotReady { .. })
        ));
    }

    #[test]
    fn get_after_record_is_stable() {
        let mut registry = OutputRegistry::new();
        registry
            .record("ContactsTable", &outputs(&[("name", "dev-contacts")]))
            .unwrap();
        assert_eq!(registry.get("ContactsTable", "name").unwrap(), "dev-contacts");
        assert_eq!(registry.get("ContactsTable", "name").unwrap(), "dev-contacts");
    }

    #[test]
    fn unknown_key_on_ready_node_is_missing_output() {
        let mut registry = OutputRegistry::new();
        registry
            .record("ContactsTable", &outputs(&[("name", "dev-contacts")]))
            .unwrap();
        assert!(matches!(
            registry.get("ContactsTable", "arn"),
            Err(Error::MissingOutput { .. })
        ));
    }

    #[test]
    fn identical_re_record_is_a_no_op() {
        let mut registry = OutputRegistry::new();
        let values = outputs(&[("name", "dev-contacts")]);
        registry.record("ContactsTable", &values).unwrap();
        registry.record("ContactsTable", &values).unwrap();
        assert_eq!(registry.get("ContactsTable", "name").unwrap(), "dev-contacts");
    }

    #[test]
    fn divergent_re_record_is_a_defect() {
        let mut registry = OutputRegistry::new();
        registry
            .record("ContactsTable", &outputs(&[("name", "dev-contacts")]))
            .unwrap();
        let err = registry
            .record("ContactsTable", &outputs(&[("name", "other")]))
            .unwrap_err();
        assert!(matches!(err, Error::OutputConflict { .. }));
    }

    #[test]
    fn resolve_substitutes_references() {
        let mut registry = OutputRegistry::new();
        registry
            .record("ContactsTable", &outputs(&[("name", "dev-contacts")]))
            .unwrap();

        let node = ResourceNode::new(NodeKind::Function, "CreateContact")
            .attr("handler", AttrValue::literal("create-contact"))
            .attr("env.TABLE_NAME", AttrValue::reference("ContactsTable", "name"));

        let resolved = registry.resolve(&node).unwrap();
        assert_eq!(resolved["handler"], "create-contact");
        assert_eq!(resolved["env.TABLE_NAME"], "dev-contacts");
    }

    #[test]
    fn resolve_with_unready_reference_is_fatal() {
        let registry = OutputRegistry::new();
        let node = ResourceNode::new(NodeKind::Function, "CreateContact")
            .attr("table", AttrValue::reference("ContactsTable", "arn"));
        assert!(matches!(
            registry.resolve(&node),
            Err(Error::NotReady { .. })
        ));
    }
}
