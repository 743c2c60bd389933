//! Local state-file backend.
//!
//! Materializes resources as records in a JSON state document with
//! deterministic generated identifiers, so repeated runs converge without a
//! cloud account and tests can drive the full engine. Real cloud backends
//! implement the same [`Provider`] trait.

use chrono::{DateTime, Utc};
use provision::{DeleteOutcome, Error, NodeKind, Outputs, Provider, ResourceSpec, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalState {
    #[serde(default)]
    resources: BTreeMap<String, ResourceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceRecord {
    kind: NodeKind,
    #[serde(default)]
    region: Option<String>,
    attributes: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
    created_at: DateTime<Utc>,
}

/// Provider that keeps every resource in a JSON state file.
pub struct LocalProvider {
    state_path: PathBuf,
    state: Mutex<LocalState>,
    faults: Mutex<HashMap<String, u32>>,
}

impl LocalProvider {
    /// Open (or initialize) the state document at `state_path`.
    pub fn open(state_path: impl Into<PathBuf>) -> Result<Self> {
        let state_path = state_path.into();
        let state = if state_path.exists() {
            let raw = fs::read_to_string(&state_path).map_err(|e| {
                Error::terminal(format!("could not read {}: {e}", state_path.display()))
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                Error::terminal(format!("invalid state in {}: {e}", state_path.display()))
            })?
        } else {
            LocalState::default()
        };

        Ok(Self {
            state_path,
            state: Mutex::new(state),
            faults: Mutex::new(HashMap::new()),
        })
    }

    /// Script the next `times` creations of node `id` to fail transiently.
    #[cfg(test)]
    pub fn fail_create(&self, id: &str, times: u32) {
        self.faults.lock().unwrap().insert(id.to_string(), times);
    }

    /// Outputs and creation time of a provisioned node, if present.
    pub fn record(&self, kind: NodeKind, id: &str) -> Option<(Outputs, DateTime<Utc>)> {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&key(kind, id))
            .map(|r| (r.outputs.clone(), r.created_at))
    }

    /// Number of provisioned resources in the state document.
    pub fn resource_count(&self) -> usize {
        self.state.lock().unwrap().resources.len()
    }

    fn persist(&self, state: &LocalState) -> Result<()> {
        if let Some(parent) = self.state_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::terminal(format!("could not create {}: {e}", parent.display()))
            })?;
        }
        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| Error::terminal(format!("could not serialize state: {e}")))?;
        fs::write(&self.state_path, raw).map_err(|e| {
            Error::terminal(format!("could not write {}: {e}", self.state_path.display()))
        })
    }

    fn deploy(&self, spec: &ResourceSpec) -> Result<Outputs> {
        let source = Path::new(
            spec.attributes
                .get("source")
                .map_or("", String::as_str),
        );
        let bundle = crate::assets::scan(source)
            .map_err(|e| Error::terminal(e.to_string()))?
            .ok_or_else(|| {
                Error::terminal(format!("asset directory {} does not exist", source.display()))
            })?;

        let mut outputs = Outputs::new();
        outputs.insert("files".into(), bundle.files.to_string());
        outputs.insert("content_hash".into(), bundle.hash);
        outputs.insert(
            "invalidated".into(),
            spec.attributes
                .get("invalidate")
                .cloned()
                .unwrap_or_else(|| "/*".into()),
        );
        Ok(outputs)
    }
}

impl Provider for LocalProvider {
    fn lookup(&self, spec: &ResourceSpec) -> Result<Option<Outputs>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .resources
            .get(&key(spec.kind, &spec.id))
            .filter(|r| r.attributes == spec.attributes && r.region == spec.region)
            .map(|r| r.outputs.clone()))
    }

    fn create(&self, spec: &ResourceSpec) -> Result<Outputs> {
        if let Some(remaining) = self.faults.lock().unwrap().get_mut(&spec.id)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::transient(format!(
                "{} {} is rate limited",
                spec.kind, spec.id
            )));
        }

        let outputs = match spec.kind {
            NodeKind::Deployment => self.deploy(spec)?,
            _ => synthesize(spec),
        };

        let mut state = self.state.lock().unwrap();
        state.resources.insert(
            key(spec.kind, &spec.id),
            ResourceRecord {
                kind: spec.kind,
                region: spec.region.clone(),
                attributes: spec.attributes.clone(),
                outputs: outputs.clone(),
                created_at: Utc::now(),
            },
        );
        self.persist(&state)?;
        Ok(outputs)
    }

    fn delete(&self, kind: NodeKind, id: &str, _region: Option<&str>) -> Result<DeleteOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.resources.remove(&key(kind, id)).is_some() {
            self.persist(&state)?;
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

fn key(kind: NodeKind, id: &str) -> String {
    format!("{}/{id}", kind.as_str())
}

/// Short deterministic identifier derived from the spec, so re-creating an
/// unchanged resource yields the same generated names.
fn suffix(spec: &ResourceSpec) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(spec.kind.as_str().as_bytes());
    hasher.update(spec.id.as_bytes());
    if let Some(region) = &spec.region {
        hasher.update(region.as_bytes());
    }
    for (k, v) in &spec.attributes {
        hasher.update(k.as_bytes());
        hasher.update(v.as_bytes());
    }
    hasher.finalize().to_hex()[..12].to_string()
}

fn synthesize(spec: &ResourceSpec) -> Outputs {
    let sfx = suffix(spec);
    let attr = |key: &str| spec.attributes.get(key).cloned().unwrap_or_default();
    let mut outputs = Outputs::new();
    match spec.kind {
        NodeKind::Zone => {
            outputs.insert("id".into(), format!("Z{}", sfx.to_uppercase()));
            outputs.insert("domain".into(), attr("domain"));
        }
        NodeKind::Certificate => {
            let region = spec.region.as_deref().unwrap_or("global");
            outputs.insert("arn".into(), format!("arn:local:certificate:{region}:{sfx}"));
            outputs.insert("domain".into(), attr("domain"));
        }
        NodeKind::Table => {
            outputs.insert("name".into(), attr("name"));
            outputs.insert("arn".into(), format!("arn:local:table:{sfx}"));
        }
        NodeKind::Function => {
            outputs.insert("name".into(), spec.id.clone());
            outputs.insert("arn".into(), format!("arn:local:function:{sfx}"));
        }
        NodeKind::Gateway => {
            outputs.insert("id".into(), format!("gw-{sfx}"));
            outputs.insert("domain".into(), format!("{sfx}.gateway.local"));
            outputs.insert("endpoint".into(), format!("https://{}", attr("domain")));
        }
        NodeKind::Bucket => {
            outputs.insert("name".into(), attr("name"));
            outputs.insert("arn".into(), format!("arn:local:bucket:{sfx}"));
            outputs.insert("domain".into(), format!("{}.storage.local", attr("name")));
        }
        NodeKind::Distribution => {
            outputs.insert("id".into(), format!("dist-{sfx}"));
            outputs.insert("domain".into(), format!("{sfx}.cdn.local"));
        }
        NodeKind::AliasRecord => {
            outputs.insert("fqdn".into(), attr("name"));
            outputs.insert("target".into(), attr("target"));
        }
        // Deployments are handled by `deploy`, which inspects the bundle
        NodeKind::Deployment => {}
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: NodeKind, id: &str, attrs: &[(&str, &str)]) -> ResourceSpec {
        ResourceSpec {
            id: id.to_string(),
            kind,
            region: None,
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn create_then_lookup_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::open(dir.path().join("state.json")).unwrap();
        let spec = spec(NodeKind::Table, "ContactsTable", &[("name", "dev1-contacts")]);

        assert!(provider.lookup(&spec).unwrap().is_none());
        let created = provider.create(&spec).unwrap();
        assert_eq!(created["name"], "dev1-contacts");
        assert_eq!(provider.lookup(&spec).unwrap().unwrap(), created);
    }

    #[test]
    fn lookup_rejects_drifted_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::open(dir.path().join("state.json")).unwrap();
        provider
            .create(&spec(NodeKind::Table, "ContactsTable", &[("name", "dev1-contacts")]))
            .unwrap();

        let drifted = spec(NodeKind::Table, "ContactsTable", &[("name", "dev2-contacts")]);
        assert!(provider.lookup(&drifted).unwrap().is_none());
    }

    #[test]
    fn state_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let spec = spec(NodeKind::Zone, "Zone", &[("domain", "example.com")]);

        let first = LocalProvider::open(&path).unwrap();
        let outputs = first.create(&spec).unwrap();
        drop(first);

        let second = LocalProvider::open(&path).unwrap();
        assert_eq!(second.lookup(&spec).unwrap().unwrap(), outputs);
        assert_eq!(second.resource_count(), 1);
    }

    #[test]
    fn generated_identifiers_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec(NodeKind::Gateway, "ContactsApi", &[("domain", "api.dev1.example.com")]);

        let a = LocalProvider::open(dir.path().join("a.json")).unwrap();
        let b = LocalProvider::open(dir.path().join("b.json")).unwrap();
        assert_eq!(a.create(&spec).unwrap(), b.create(&spec).unwrap());
    }

    #[test]
    fn delete_tolerates_absent_resources() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::open(dir.path().join("state.json")).unwrap();
        let spec = spec(NodeKind::Bucket, "SiteBucket", &[("name", "dev1.example.com")]);

        provider.create(&spec).unwrap();
        assert_eq!(
            provider.delete(NodeKind::Bucket, "SiteBucket", None).unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            provider.delete(NodeKind::Bucket, "SiteBucket", None).unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn scripted_faults_are_transient_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::open(dir.path().join("state.json")).unwrap();
        provider.fail_create("Zone", 1);

        let spec = spec(NodeKind::Zone, "Zone", &[("domain", "example.com")]);
        let err = provider.create(&spec).unwrap_err();
        assert!(err.is_retryable());
        assert!(provider.create(&spec).is_ok());
    }
}
