//! Change notification for views rendering the store.

use std::collections::BTreeMap;

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A local edit through [`Store::q_mutation`](crate::Store::q_mutation)
    /// or the repository.
    Local,
    /// An inbound server message applied with
    /// [`Store::insert_data`](crate::Store::insert_data).
    Remote,
}

/// Paths (full topics such as `$config/widgets/w00001` or `sd/room/temp`)
/// whose values changed in one store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub origin: ChangeOrigin,
    pub paths: Vec<String>,
}

impl ChangeEvent {
    /// Whether `path` or anything above or below it changed.
    pub fn touches(&self, path: &str) -> bool {
        let path = path.trim_matches('/');
        self.paths.iter().any(|p| {
            p == path
                || p.strip_prefix(path).is_some_and(|rest| rest.starts_with('/'))
                || path.strip_prefix(p.as_str()).is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

type Listener = Box<dyn FnMut(&ChangeEvent) + Send>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(self.next_id, listener);
        self.next_id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn emit(&mut self, event: &ChangeEvent) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}
