//! In-memory stand-ins for the Redis transport and the sentinel topology.
//!
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use parking_lot::Mutex;
use sentinel_cache::cache::{
  Connector, DirectProvider, EncodedValue, Endpoint, KeyMaker, KvClient, Options, RedisCache,
  SentinelConnector, SentinelProvider, Topology,
};
use sentinel_cache::{CacheError, CacheResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Keyspace shared by every fake node, standing in for replication
#[derive(Clone, Default)]
pub struct MemoryStore {
  entries: Arc<Mutex<HashMap<String, (Vec<u8>, Option<u64>)>>>,
}

impl MemoryStore {
  pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
    self.entries.lock().get(key).map(|(v, _)| v.clone())
  }

  pub fn ttl(&self, key: &str) -> Option<Option<u64>> {
    self.entries.lock().get(key).map(|(_, ttl)| *ttl)
  }

  pub fn put_raw(&self, key: &str, value: &[u8]) {
    self.entries.lock().insert(key.to_string(), (value.to_vec(), None));
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }
}

/// Ordered record of commands, tagged with the node that served them
#[derive(Clone, Default)]
pub struct CommandLog {
  lines: Arc<Mutex<Vec<String>>>,
}

impl CommandLog {
  fn push(&self, node: &str, command: &str, key: &str) {
    self.lines.lock().push(format!("{} {} {}", node, command, key));
  }

  pub fn lines(&self) -> Vec<String> {
    self.lines.lock().clone()
  }

  pub fn clear(&self) {
    self.lines.lock().clear();
  }
}

pub struct FakeClient {
  node: String,
  store: MemoryStore,
  log: CommandLog,
  /// Apply SETs but report them as not applied
  report_set_failure: bool,
  closed: Arc<AtomicUsize>,
  open: Arc<AtomicBool>,
}

impl FakeClient {
  pub fn new(node: &str, store: MemoryStore, log: CommandLog) -> Self {
    Self {
      node: node.to_string(),
      store,
      log,
      report_set_failure: false,
      closed: Arc::new(AtomicUsize::new(0)),
      open: Arc::new(AtomicBool::new(true)),
    }
  }

  fn counter(&mut self, key: &str, delta: i64) -> CacheResult<i64> {
    let mut entries = self.store.entries.lock();
    let current = match entries.get(key) {
      None => 0,
      Some((bytes, _)) => std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
          CacheError::Transport(
            (
              redis::ErrorKind::TypeError,
              "value is not an integer or out of range",
            )
              .into(),
          )
        })?,
    };
    let next = current + delta;
    let ttl = entries.get(key).and_then(|(_, ttl)| *ttl);
    entries.insert(key.to_string(), (next.to_string().into_bytes(), ttl));
    Ok(next)
  }
}

impl KvClient for FakeClient {
  fn address(&self) -> String {
    self.node.clone()
  }

  fn get(&mut self, key: &str) -> CacheResult<Option<EncodedValue>> {
    self.log.push(&self.node, "GET", key);
    Ok(self.store.raw(key).map(EncodedValue::from_stored))
  }

  fn set(
    &mut self,
    key: &str,
    value: &EncodedValue,
    ttl: Option<u64>,
    only_if_absent: bool,
  ) -> CacheResult<bool> {
    self.log.push(&self.node, if only_if_absent { "SETNX" } else { "SET" }, key);
    let mut entries = self.store.entries.lock();
    if only_if_absent && entries.contains_key(key) {
      return Ok(false);
    }
    entries.insert(key.to_string(), (value.to_wire(), ttl));
    Ok(!self.report_set_failure)
  }

  fn delete(&mut self, key: &str) -> CacheResult<()> {
    self.log.push(&self.node, "DEL", key);
    self.store.entries.lock().remove(key);
    Ok(())
  }

  fn incr(&mut self, key: &str, delta: i64) -> CacheResult<i64> {
    self.log.push(&self.node, "INCRBY", key);
    self.counter(key, delta)
  }

  fn decr(&mut self, key: &str, delta: i64) -> CacheResult<i64> {
    self.log.push(&self.node, "DECRBY", key);
    self.counter(key, -delta)
  }

  fn expire(&mut self, key: &str, ttl: Option<u64>) -> CacheResult<bool> {
    self.log.push(&self.node, "EXPIRE", key);
    match self.store.entries.lock().get_mut(key) {
      Some(entry) => {
        entry.1 = ttl;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  fn flush_db(&mut self) -> CacheResult<()> {
    self.log.push(&self.node, "FLUSHDB", "*");
    self.store.entries.lock().clear();
    Ok(())
  }

  fn is_open(&self) -> bool {
    self.open.load(Ordering::SeqCst)
  }

  fn close(&mut self) -> CacheResult<()> {
    self.closed.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

/// Single-node connector counting how many connections it opened
#[derive(Clone, Default)]
pub struct FakeConnector {
  pub store: MemoryStore,
  pub log: CommandLog,
  pub connects: Arc<AtomicUsize>,
  pub closes: Arc<AtomicUsize>,
  pub report_set_failure: bool,
  /// Liveness flag of the most recently opened client
  pub live: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

impl FakeConnector {
  /// Mark the current connection as dropped by the server
  pub fn drop_connection(&self) {
    if let Some(open) = self.live.lock().as_ref() {
      open.store(false, Ordering::SeqCst);
    }
  }

  pub fn connect_count(&self) -> usize {
    self.connects.load(Ordering::SeqCst)
  }

  pub fn close_count(&self) -> usize {
    self.closes.load(Ordering::SeqCst)
  }
}

impl Connector for FakeConnector {
  type Client = FakeClient;

  fn connect(&self, endpoint: &Endpoint, _options: &Options) -> CacheResult<FakeClient> {
    endpoint.port_number()?;
    self.connects.fetch_add(1, Ordering::SeqCst);
    let mut client = FakeClient::new(&endpoint.to_string(), self.store.clone(), self.log.clone());
    client.report_set_failure = self.report_set_failure;
    client.closed = self.closes.clone();
    *self.live.lock() = Some(client.open.clone());
    Ok(client)
  }
}

/// Answers to successive resolutions; the last answer repeats. `None`
/// means the monitors cannot name a node.
#[derive(Clone, Default)]
pub struct Script {
  answers: Arc<Mutex<VecDeque<Option<String>>>>,
}

impl Script {
  pub fn new(answers: &[Option<&str>]) -> Self {
    Self {
      answers: Arc::new(Mutex::new(
        answers.iter().map(|a| a.map(str::to_string)).collect(),
      )),
    }
  }

  pub fn always(node: &str) -> Self {
    Self::new(&[Some(node)])
  }

  fn next(&self) -> Option<String> {
    let mut answers = self.answers.lock();
    if answers.len() > 1 {
      answers.pop_front().flatten()
    } else {
      answers.front().cloned().flatten()
    }
  }
}

pub struct ScriptedTopology {
  masters: Script,
  replicas: Script,
  groups: Arc<Mutex<Vec<String>>>,
  store: MemoryStore,
  log: CommandLog,
  nodes: HashMap<String, FakeClient>,
}

impl ScriptedTopology {
  fn resolve(&mut self, group: &str, script: &Script, role: &'static str) -> CacheResult<&mut FakeClient> {
    self.groups.lock().push(format!("{} {}", role, group));
    let node = script.next().ok_or_else(|| CacheError::TopologyUnavailable {
      group: group.to_string(),
      role,
      reason: "no node reported by monitors".to_string(),
    })?;
    let store = self.store.clone();
    let log = self.log.clone();
    Ok(
      self
        .nodes
        .entry(node.clone())
        .or_insert_with(|| FakeClient::new(&node, store, log)),
    )
  }
}

impl Topology for ScriptedTopology {
  type Client = FakeClient;

  fn master_for(&mut self, group: &str) -> CacheResult<&mut FakeClient> {
    let script = self.masters.clone();
    self.resolve(group, &script, "master")
  }

  fn replica_for(&mut self, group: &str) -> CacheResult<&mut FakeClient> {
    let script = self.replicas.clone();
    self.resolve(group, &script, "replica")
  }
}

/// Sentinel connector handing out scripted topologies
#[derive(Clone, Default)]
pub struct FakeSentinelConnector {
  pub masters: Script,
  pub replicas: Script,
  pub store: MemoryStore,
  pub log: CommandLog,
  /// Resolution requests as "role group"
  pub resolutions: Arc<Mutex<Vec<String>>>,
  pub connects: Arc<AtomicUsize>,
  pub seen_monitors: Arc<Mutex<Vec<Endpoint>>>,
  pub seen_options: Arc<Mutex<Options>>,
}

impl FakeSentinelConnector {
  pub fn new(masters: Script, replicas: Script) -> Self {
    Self {
      masters,
      replicas,
      ..Default::default()
    }
  }

  pub fn connect_count(&self) -> usize {
    self.connects.load(Ordering::SeqCst)
  }

  pub fn resolutions(&self) -> Vec<String> {
    self.resolutions.lock().clone()
  }
}

impl SentinelConnector for FakeSentinelConnector {
  type Topology = ScriptedTopology;

  fn connect(&self, monitors: &[Endpoint], options: &Options) -> CacheResult<ScriptedTopology> {
    self.connects.fetch_add(1, Ordering::SeqCst);
    *self.seen_monitors.lock() = monitors.to_vec();
    *self.seen_options.lock() = options.clone();
    Ok(ScriptedTopology {
      masters: self.masters.clone(),
      replicas: self.replicas.clone(),
      groups: self.resolutions.clone(),
      store: self.store.clone(),
      log: self.log.clone(),
      nodes: HashMap::new(),
    })
  }
}

pub fn direct_cache(connector: FakeConnector) -> RedisCache<DirectProvider<FakeConnector>> {
  RedisCache::with_provider(
    DirectProvider::new(Endpoint::parse("localhost:6379"), Options::new(), connector),
    KeyMaker::default(),
    Some(300),
  )
}

pub fn sentinel_cache(
  connector: FakeSentinelConnector,
  group: &str,
) -> RedisCache<SentinelProvider<FakeSentinelConnector>> {
  RedisCache::with_provider(
    SentinelProvider::new(
      vec![Endpoint::parse("h1:26379"), Endpoint::parse("h2:26379")],
      Options::new(),
      group,
      connector,
    ),
    KeyMaker::default(),
    Some(300),
  )
}
