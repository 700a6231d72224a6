//! Undo-recording batch mutations of `$config`.

use dash_topic::{get, join_path, split_topic, CONFIG_ROOT};
use indexmap::IndexSet;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::events::ChangeOrigin;
use crate::store::{Prior, Store};
use crate::sync::SyncMessage;

/// One `[path, value]` pair of a batch. Paths are relative to `$config/`;
/// `value: None` deletes the target.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub path: String,
    pub value: Option<Value>,
}

impl Mutation {
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: None,
        }
    }
}

/// Entity a `$config`-relative path belongs to: `dash` for anything under
/// `dash`, otherwise the first two segments (`widgets/w00001`).
///
/// ```
/// use dash_store::scope_of;
///
/// assert_eq!(scope_of("dash/tabs/1").as_deref(), Some("dash"));
/// assert_eq!(scope_of("widgets/w00001/static/title").as_deref(), Some("widgets/w00001"));
/// assert_eq!(scope_of("conn").as_deref(), Some("conn"));
/// assert_eq!(scope_of("//"), None);
/// ```
pub fn scope_of(path: &str) -> Option<String> {
    let segments = split_topic(path);
    match segments.as_slice() {
        [] => None,
        [first, ..] if first == "dash" => Some(first.clone()),
        [first] => Some(first.clone()),
        [first, second, ..] => Some(format!("{first}/{second}")),
    }
}

impl Store {
    /// Applies `batch` to `$config` as one unit.
    ///
    /// Either every pair is applied or, on the first failure, the config is
    /// restored and the error returned with nothing recorded or sent. On
    /// success the inverse batch is pushed to the undo buffer under `tagline`
    /// (skipped for `None`, which is how undo replays itself) and a snapshot
    /// of each touched entity goes to the sync collaborator.
    pub fn q_mutation(
        &mut self,
        tagline: Option<&str>,
        batch: Vec<Mutation>,
    ) -> Result<(), StoreError> {
        let snapshot = self.config().clone();
        let mut undo_batch = Vec::with_capacity(batch.len());
        let mut changed = Vec::with_capacity(batch.len());
        let mut scopes = IndexSet::new();

        for mutation in batch {
            match self.apply_config(&mutation) {
                Ok(inverse) => {
                    undo_batch.push(inverse);
                    let relative = join_path(&split_topic(&mutation.path));
                    changed.push(format!("{CONFIG_ROOT}/{relative}"));
                    if let Some(scope) = scope_of(&mutation.path) {
                        scopes.insert(scope);
                    }
                }
                Err(err) => {
                    warn!(?tagline, path = %mutation.path, %err, "mutation failed, rolling back");
                    self.restore_config(snapshot);
                    return Err(err);
                }
            }
        }
        // Last applied is undone first.
        undo_batch.reverse();

        if let Some(tagline) = tagline {
            let now = self.now();
            self.undo.push(tagline, undo_batch, now);
        }
        for scope in scopes {
            self.send_mutation(&scope);
        }
        self.notify(ChangeOrigin::Local, changed);
        Ok(())
    }

    /// Forwards the committed entity that `path` belongs to.
    ///
    /// Always a whole-entity snapshot, never a property delta; an entity
    /// that no longer exists is sent as an unset.
    pub fn send_mutation(&mut self, path: &str) {
        let Some(scope) = scope_of(path) else {
            return;
        };
        let topic = format!("{CONFIG_ROOT}/{scope}");
        let message = match get(self.config(), &split_topic(&scope)) {
            Some(entity) => SyncMessage::Set {
                topic,
                payload: entity.clone(),
            },
            None => SyncMessage::Unset { topic },
        };
        self.send(message);
    }

    /// Reverts the newest undo entry.
    pub fn perform_undo(&mut self) -> Result<(), StoreError> {
        let entry = self.undo.pop_entry()?;
        info!(tagline = %entry.tagline, "undo");
        if let Err(err) = self.q_mutation(None, entry.mutation.clone()) {
            self.undo.restore(entry);
            return Err(err);
        }
        Ok(())
    }

    /// Applies one pair and returns its inverse.
    fn apply_config(&mut self, mutation: &Mutation) -> Result<Mutation, StoreError> {
        let relative = split_topic(&mutation.path);
        if relative.is_empty() {
            return Err(StoreError::CannotReplaceRoot);
        }
        let mut path = Vec::with_capacity(relative.len() + 1);
        path.push(CONFIG_ROOT.to_string());
        path.extend(relative.iter().cloned());

        let inverse = match self.write(&path, mutation.value.clone())? {
            Prior::Existing(old) => Mutation::set(join_path(&relative), old),
            Prior::Vacant => Mutation::delete(join_path(&relative)),
            // Array elements cannot be deleted, so an append is undone by
            // restoring the whole array as it was.
            Prior::Appended => {
                let parent = &relative[..relative.len() - 1];
                let mut before = get(self.config(), parent)
                    .cloned()
                    .unwrap_or(Value::Null);
                if let Value::Array(items) = &mut before {
                    items.pop();
                }
                Mutation::set(join_path(parent), before)
            }
        };
        Ok(inverse)
    }

    fn restore_config(&mut self, snapshot: Value) {
        if let Value::Object(root) = &mut self.root {
            root.insert(CONFIG_ROOT.to_string(), snapshot);
        }
    }
}
