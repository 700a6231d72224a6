use std::cmp::Ordering;

use dash_topic::{
    get, join_path, kind_of, parse_index, resolve, route, split_topic, Namespace, CONFIG_ROOT,
    SERVER_DATA_ROOT,
};
use dash_util::{Clock, DigitSource, SystemClock};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::events::{ChangeEvent, ChangeOrigin, Listeners};
use crate::sync::{ServerSync, SyncMessage};
use crate::undo::UndoBuffer;

static NULL: Value = Value::Null;

/// What a single write replaced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Prior {
    Existing(Value),
    Vacant,
    Appended,
}

impl Prior {
    pub(crate) fn into_value(self) -> Option<Value> {
        match self {
            Prior::Existing(v) => Some(v),
            Prior::Vacant | Prior::Appended => None,
        }
    }
}

/// The dashboard store: one document holding `$config` and `sd`, plus the
/// undo history, id source, sync collaborator and change listeners.
///
/// Construct one per dashboard and hand it to whatever owns the UI tree.
/// All operations are synchronous and take `&mut self`.
pub struct Store {
    pub(crate) root: Value,
    pub(crate) undo: UndoBuffer,
    pub(crate) config: StoreConfig,
    pub(crate) ids: DigitSource,
    pub(crate) clock: Box<dyn Clock + Send>,
    pub(crate) sync: Option<Box<dyn ServerSync + Send>>,
    pub(crate) listeners: Listeners,
}

impl Store {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let mut root = Map::new();
        for ns in [Namespace::ServerData, Namespace::Config] {
            root.insert(ns.root_key().to_string(), Value::Object(Map::new()));
        }
        Self {
            root: Value::Object(root),
            undo: UndoBuffer::new(config.undo_capacity, config.coalesce_window()),
            ids: DigitSource::new(config.seed),
            config,
            clock: Box::new(SystemClock),
            sync: None,
            listeners: Listeners::default(),
        }
    }

    /// Replaces the time source used for undo coalescing.
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Attaches the collaborator that receives entity snapshots.
    pub fn with_sync(mut self, sync: impl ServerSync + Send + 'static) -> Self {
        self.set_sync(sync);
        self
    }

    pub fn set_sync(&mut self, sync: impl ServerSync + Send + 'static) {
        self.sync = Some(Box::new(sync));
    }

    pub fn clear_sync(&mut self) {
        self.sync = None;
    }

    pub fn settings(&self) -> &StoreConfig {
        &self.config
    }

    /// The whole document, `{"sd": .., "$config": ..}`.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The `$config` subtree.
    pub fn config(&self) -> &Value {
        self.root.get(CONFIG_ROOT).unwrap_or(&NULL)
    }

    /// The `sd` (server data) subtree.
    pub fn sd(&self) -> &Value {
        self.root.get(SERVER_DATA_ROOT).unwrap_or(&NULL)
    }

    /// Reads the value at `topic`, routed the same way as
    /// [`insert_data`](Self::insert_data). Never creates nodes.
    pub fn get(&self, topic: &str) -> Option<&Value> {
        get(&self.root, &route(split_topic(topic)))
    }

    pub fn undo_buffer(&self) -> &UndoBuffer {
        &self.undo
    }

    /// Registers a listener called after every committed change.
    pub fn on_change<F>(&mut self, listener: F) -> u64
    where
        F: FnMut(&ChangeEvent) + Send + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn off_change(&mut self, listener_id: u64) -> bool {
        self.listeners.remove(listener_id)
    }

    /// Writes `payload` at `topic` and returns what was there before.
    ///
    /// `None` as payload deletes the target. Topics not starting with
    /// `$config` go into the `sd` namespace. The bare topic `$config`
    /// merges each top-level key of an object payload into the config root.
    ///
    /// This is the entry point for inbound server messages: nothing is
    /// recorded for undo and nothing is sent back to the server. Appending
    /// to an array, or creating a missing key, returns `None`.
    pub fn insert_data(
        &mut self,
        topic: &str,
        payload: Option<Value>,
    ) -> Result<Option<Value>, StoreError> {
        let segments = split_topic(topic);
        if segments.is_empty() {
            warn!(topic, "refusing to replace the entire tree");
            return Err(StoreError::CannotReplaceRoot);
        }
        if segments.len() == 1 && segments[0] == CONFIG_ROOT {
            let changed = self.merge_config(payload)?;
            self.notify(ChangeOrigin::Remote, changed);
            return Ok(None);
        }
        let path = route(segments);
        let prior = self.write(&path, payload).inspect_err(|err| {
            warn!(topic, %err, "rejected write");
        })?;
        self.notify(ChangeOrigin::Remote, vec![join_path(&path)]);
        Ok(prior.into_value())
    }

    /// Shallow-replaces each top-level key of `payload` into `$config`.
    pub(crate) fn merge_config(&mut self, payload: Option<Value>) -> Result<Vec<String>, StoreError> {
        let Some(Value::Object(sections)) = payload else {
            return Err(StoreError::InvalidPayload {
                topic: CONFIG_ROOT.to_string(),
                reason: "bulk config load needs an object".to_string(),
            });
        };
        let config = match resolve(&mut self.root, &[CONFIG_ROOT])? {
            Value::Object(config) => config,
            other => {
                return Err(StoreError::NotContainer {
                    topic: CONFIG_ROOT.to_string(),
                    found: kind_of(other),
                })
            }
        };
        let mut changed = Vec::with_capacity(sections.len());
        for (key, value) in sections {
            changed.push(format!("{CONFIG_ROOT}/{key}"));
            config.insert(key, value);
        }
        info!(sections = ?changed, "loaded $config");
        Ok(changed)
    }

    /// Writes at a routed path (first segment `$config` or `sd`).
    pub(crate) fn write(&mut self, path: &[String], payload: Option<Value>) -> Result<Prior, StoreError> {
        let (key, parent) = path.split_last().ok_or(StoreError::CannotReplaceRoot)?;
        let topic = || join_path(path);
        let dir = resolve(&mut self.root, parent)?;
        let prior = match dir {
            Value::Array(arr) => {
                let len = arr.len();
                let ix = parse_index(key).ok_or_else(|| StoreError::IndexError {
                    index: key.clone(),
                    len,
                })?;
                match (ix.cmp(&len), payload) {
                    (Ordering::Less, Some(value)) => {
                        Prior::Existing(std::mem::replace(&mut arr[ix], value))
                    }
                    (Ordering::Less, None) => {
                        return Err(StoreError::ArrayDeleteUnsupported { topic: topic() })
                    }
                    (Ordering::Equal, Some(value)) => {
                        arr.push(value);
                        Prior::Appended
                    }
                    (Ordering::Equal, None) => {
                        return Err(StoreError::ArrayAppendDeleteUnsupported { topic: topic() })
                    }
                    (Ordering::Greater, _) => return Err(StoreError::bad_index(ix, len)),
                }
            }
            Value::Object(map) => {
                let old = match payload {
                    Some(value) => map.insert(key.clone(), value),
                    None => map.shift_remove(key.as_str()),
                };
                old.map_or(Prior::Vacant, Prior::Existing)
            }
            other => {
                return Err(StoreError::NotContainer {
                    topic: topic(),
                    found: kind_of(other),
                })
            }
        };
        debug!(topic = %topic(), ?prior, "updated");
        Ok(prior)
    }

    pub(crate) fn notify(&mut self, origin: ChangeOrigin, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        self.listeners.emit(&ChangeEvent { origin, paths });
    }

    pub(crate) fn send(&mut self, message: SyncMessage) {
        match self.sync.as_mut() {
            Some(sync) => sync.server_send(message),
            None => debug!(topic = message.topic(), "no sync attached, dropping"),
        }
    }

    pub(crate) fn now(&self) -> std::time::Duration {
        self.clock.now()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
