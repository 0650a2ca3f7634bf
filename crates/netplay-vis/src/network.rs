//! In-memory network store.
//!
//! Keeps one persisted document per network: nodes, edges, queued jobs and
//! the last simulation result. Any change to the topology's nodes through
//! [`NetworkStore::replace_nodes`] or [`NetworkStore::replace_topology`]
//! drops the stored result, since it no longer matches the topology.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use netplay_topology::{DeviceType, EdgeDescriptor, NodeDescriptor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::collaborators::Persistence;
use crate::error::{Error, Result};
use crate::events::{Job, PacketCollection};
use crate::playback::NetworkId;

fn packets_or_null<'de, D>(deserializer: D) -> std::result::Result<PacketCollection, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PacketCollection>::deserialize(deserializer)?.unwrap_or_default())
}

/// The persisted topology document. Missing keys load as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub edges: Vec<EdgeDescriptor>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default, deserialize_with = "packets_or_null")]
    pub packets: PacketCollection,
}

/// One stored network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub guid: NetworkId,
    pub title: String,
    /// Whether other users may open the read-only shared view
    pub share_mode: bool,
    /// A simulation was requested and has not reported back yet
    pub simulating: bool,
    pub document: NetworkDocument,
    /// Bumped on every write
    pub revision: u64,
}

impl NetworkRecord {
    pub fn new(guid: NetworkId, title: impl Into<String>) -> Self {
        Self {
            guid,
            title: title.into(),
            share_mode: false,
            simulating: false,
            document: NetworkDocument::default(),
            revision: 0,
        }
    }
}

/// Shared handle to all stored networks. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct NetworkStore {
    networks: Arc<Mutex<HashMap<NetworkId, NetworkRecord>>>,
}

impl NetworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_networks<T>(&self, f: impl FnOnce(&mut HashMap<NetworkId, NetworkRecord>) -> T) -> T {
        let mut networks = self.networks.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut networks)
    }

    fn update<T>(&self, guid: &NetworkId, f: impl FnOnce(&mut NetworkRecord) -> T) -> Result<T> {
        self.with_networks(|networks| {
            let record = networks
                .get_mut(guid)
                .ok_or_else(|| Error::NetworkNotFound(guid.to_string()))?;
            let out = f(record);
            record.revision += 1;
            Ok(out)
        })
    }

    /// Create an empty network with a fresh random guid.
    pub fn create(&self, title: impl Into<String>) -> NetworkId {
        let guid = NetworkId::new(hex::encode(rand::random::<[u8; 16]>()));
        let record = NetworkRecord::new(guid.clone(), title);
        info!(network = %guid, "network created");
        self.insert(record);
        guid
    }

    /// Store a record, replacing any with the same guid.
    pub fn insert(&self, record: NetworkRecord) {
        self.with_networks(|networks| {
            networks.insert(record.guid.clone(), record);
        });
    }

    /// Create a network from a JSON document.
    pub fn import(&self, title: impl Into<String>, json: &str) -> Result<NetworkId> {
        let document: NetworkDocument = serde_json::from_str(json)?;
        let guid = self.create(title);
        self.update(&guid, |record| record.document = document)?;
        Ok(guid)
    }

    /// Serialize a network's document.
    pub fn export(&self, guid: &NetworkId) -> Result<String> {
        let record = self.get(guid)?;
        Ok(serde_json::to_string(&record.document)?)
    }

    pub fn get(&self, guid: &NetworkId) -> Result<NetworkRecord> {
        self.with_networks(|networks| networks.get(guid).cloned())
            .ok_or_else(|| Error::NetworkNotFound(guid.to_string()))
    }

    /// Fetch a network for the read-only shared view.
    pub fn shared(&self, guid: &NetworkId) -> Result<NetworkRecord> {
        let record = self.get(guid)?;
        if !record.share_mode {
            return Err(Error::NotShared(guid.to_string()));
        }
        Ok(record)
    }

    pub fn delete(&self, guid: &NetworkId) -> Result<()> {
        self.with_networks(|networks| networks.remove(guid))
            .map(|_| ())
            .ok_or_else(|| Error::NetworkNotFound(guid.to_string()))
    }

    pub fn len(&self) -> usize {
        self.with_networks(|networks| networks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rename a network. Blank titles are ignored.
    pub fn update_title(&self, guid: &NetworkId, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            // Still fail for unknown networks.
            self.get(guid)?;
            return Ok(());
        }
        self.update(guid, |record| record.title = title.to_string())
    }

    pub fn set_share_mode(&self, guid: &NetworkId, shared: bool) -> Result<()> {
        self.update(guid, |record| record.share_mode = shared)
    }

    /// Replace the node list. Drops any stored simulation.
    pub fn replace_nodes(&self, guid: &NetworkId, nodes: &[NodeDescriptor]) -> Result<()> {
        self.update(guid, |record| {
            record.document.nodes = nodes.to_vec();
            record.document.packets.clear();
            record.simulating = false;
        })
    }

    /// Replace nodes and edges, dropping jobs whose host is gone and any
    /// stored simulation. Returns how many jobs were dropped.
    pub fn replace_topology(
        &self,
        guid: &NetworkId,
        nodes: &[NodeDescriptor],
        edges: &[EdgeDescriptor],
    ) -> Result<usize> {
        self.update(guid, |record| {
            let doc = &mut record.document;
            doc.nodes = nodes.to_vec();
            doc.edges = edges.to_vec();

            let before = doc.jobs.len();
            doc.jobs.retain(|job| {
                !job.host_id.is_empty() && nodes.iter().any(|n| n.id() == job.host_id)
            });
            let pruned = before - doc.jobs.len();
            if pruned > 0 {
                debug!(network = %guid, pruned, "dropped jobs of removed hosts");
            }

            doc.packets.clear();
            record.simulating = false;
            pruned
        })
    }

    /// Store moved node positions. The simulation stays valid.
    pub fn move_nodes(&self, guid: &NetworkId, nodes: &[NodeDescriptor]) -> Result<()> {
        self.update(guid, |record| record.document.nodes = nodes.to_vec())
    }

    /// Queue a job. Only hosts run jobs.
    pub fn add_job(&self, guid: &NetworkId, job: Job) -> Result<()> {
        let record = self.get(guid)?;
        let host = record
            .document
            .nodes
            .iter()
            .find(|n| n.id() == job.host_id)
            .ok_or_else(|| netplay_topology::Error::NodeNotFound(job.host_id.clone()))?;
        if host.type_tag() != DeviceType::Host {
            return Err(Error::InvalidJob(format!(
                "{} is a {}, not a host",
                job.host_id,
                host.type_tag()
            )));
        }
        self.update(guid, |record| record.document.jobs.push(job))
    }

    /// Mark a simulation as requested.
    pub fn begin_simulation(&self, guid: &NetworkId) -> Result<()> {
        self.update(guid, |record| record.simulating = true)
    }

    /// Store a finished simulation.
    pub fn finish_simulation(&self, guid: &NetworkId, packets: PacketCollection) -> Result<()> {
        self.update(guid, |record| {
            record.simulating = false;
            record.document.packets = packets;
        })
    }
}

impl Persistence for NetworkStore {
    fn post_nodes(&mut self, network: &NetworkId, nodes: &[NodeDescriptor]) -> Result<()> {
        self.replace_nodes(network, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PacketMove;
    use netplay_topology::CanvasPosition;

    fn node(id: &str, kind: DeviceType) -> NodeDescriptor {
        NodeDescriptor::new(id.to_string(), kind, CanvasPosition::ORIGIN)
    }

    fn job(host: &str) -> Job {
        Job {
            id: format!("job-{host}"),
            host_id: host.to_string(),
            job_id: 0,
            print_cmd: "ping".to_string(),
        }
    }

    fn one_frame() -> PacketCollection {
        PacketCollection::new(vec![vec![PacketMove {
            id: "p".into(),
            label: "p".into(),
            source: "host_1".into(),
            target: "host_2".into(),
        }]])
    }

    #[test]
    fn create_issues_distinct_guids() {
        let store = NetworkStore::new();
        let a = store.create("a");
        let b = store.create("b");
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unknown_network() {
        let store = NetworkStore::new();
        let err = store.get(&NetworkId::new("missing")).unwrap_err();
        assert!(matches!(err, Error::NetworkNotFound(_)));
    }

    #[test]
    fn shared_view_requires_share_mode() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        assert!(matches!(store.shared(&guid), Err(Error::NotShared(_))));

        store.set_share_mode(&guid, true).unwrap();
        assert_eq!(store.shared(&guid).unwrap().title, "lab");
    }

    #[test]
    fn blank_title_is_ignored() {
        let store = NetworkStore::new();
        let guid = store.create("first");
        tokio_test::assert_ok!(store.update_title(&guid, "   "));
        assert_eq!(store.get(&guid).unwrap().title, "first");
        store.update_title(&guid, "  second ").unwrap();
        assert_eq!(store.get(&guid).unwrap().title, "second");
    }

    #[test]
    fn replacing_nodes_drops_simulation() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        store.finish_simulation(&guid, one_frame()).unwrap();

        store.replace_nodes(&guid, &[node("host_1", DeviceType::Host)]).unwrap();

        let record = store.get(&guid).unwrap();
        assert!(record.document.packets.is_empty());
        assert_eq!(record.document.nodes.len(), 1);
    }

    #[test]
    fn moving_nodes_keeps_simulation() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        store.finish_simulation(&guid, one_frame()).unwrap();
        store.move_nodes(&guid, &[node("host_1", DeviceType::Host)]).unwrap();
        assert!(!store.get(&guid).unwrap().document.packets.is_empty());
    }

    #[test]
    fn replacing_topology_prunes_orphan_jobs() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        let nodes = [node("host_1", DeviceType::Host), node("host_2", DeviceType::Host)];
        store.replace_nodes(&guid, &nodes).unwrap();
        store.add_job(&guid, job("host_1")).unwrap();
        store.add_job(&guid, job("host_2")).unwrap();
        store.finish_simulation(&guid, one_frame()).unwrap();

        let pruned = store.replace_topology(&guid, &nodes[..1], &[]).unwrap();

        assert_eq!(pruned, 1);
        let record = store.get(&guid).unwrap();
        assert_eq!(record.document.jobs, [job("host_1")]);
        assert!(record.document.packets.is_empty());
    }

    #[test]
    fn jobs_only_run_on_hosts() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        store.replace_nodes(&guid, &[node("l2sw1", DeviceType::L2Switch)]).unwrap();

        assert!(matches!(store.add_job(&guid, job("l2sw1")), Err(Error::InvalidJob(_))));
        tokio_test::assert_err!(store.add_job(&guid, job("host_9")));
    }

    #[test]
    fn import_tolerates_missing_keys_and_null_packets() {
        let store = NetworkStore::new();
        let guid = store.import("old", r#"{"nodes": [], "packets": null}"#).unwrap();
        let record = store.get(&guid).unwrap();
        assert!(record.document.edges.is_empty());
        assert!(record.document.jobs.is_empty());
        assert!(record.document.packets.is_empty());

        assert!(matches!(store.import("bad", "{nodes"), Err(Error::Serialization(_))));
    }

    #[test]
    fn persistence_posts_replace_nodes() {
        let mut store = NetworkStore::new();
        let guid = store.create("lab");
        let before = store.get(&guid).unwrap().revision;

        Persistence::post_nodes(&mut store, &guid, &[node("host_1", DeviceType::Host)]).unwrap();

        let record = store.get(&guid).unwrap();
        assert_eq!(record.revision, before + 1);
        assert_eq!(record.document.nodes[0].id(), "host_1");
    }

    #[test]
    fn delete_removes() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        store.delete(&guid).unwrap();
        assert!(store.is_empty());
        assert!(store.delete(&guid).is_err());
    }

    #[test]
    fn export_round_trips_through_import() {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        store.replace_nodes(&guid, &[node("host_1", DeviceType::Host)]).unwrap();

        let json = store.export(&guid).unwrap();
        let copy = tokio_test::assert_ok!(store.import("copy", &json));
        assert_eq!(store.get(&copy).unwrap().document, store.get(&guid).unwrap().document);
    }
}
