//! Schema-aware operations on `$config`: tabs own grids, grids own widgets,
//! panel widgets own child widgets.
//!
//! Every operation validates the ids it is given before building a single
//! [`q_mutation`](crate::Store::q_mutation) batch, so a bad id never reaches
//! the mutation primitive and each user action is one undo step.

mod grids;
mod tabs;
mod widgets;

use dash_util::digits::MAX_WIDTH;
use dash_util::DigitSource;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::StoreError;
use crate::events::ChangeOrigin;
use crate::schema::{id_list, to_json, Grid, Tab, Widget, DEFAULT_TITLE};
use crate::store::Store;

/// Random draws tried before falling back to a scan.
const RANDOM_ATTEMPTS: u32 = 64;

/// Widest suffix space that is still scanned exhaustively.
const SCAN_WIDTH: u32 = 6;

/// Returns `prefix` followed by `width` random digits that is not a key of
/// `collection`.
///
/// A crowded collection is scanned in order for the first free suffix, so
/// only a full id space fails.
pub fn gen_id(
    collection: Option<&Map<String, Value>>,
    prefix: &str,
    source: &mut DigitSource,
    width: u32,
) -> Result<String, StoreError> {
    let taken = |id: &str| collection.is_some_and(|c| c.contains_key(id));
    for _ in 0..RANDOM_ATTEMPTS {
        let id = format!("{prefix}{}", source.digits(width));
        if !taken(&id) {
            return Ok(id);
        }
    }
    let width = width.clamp(1, MAX_WIDTH);
    if width <= SCAN_WIDTH {
        let free = (0..10u64.pow(width))
            .map(|n| format!("{prefix}{n:0w$}", w = width as usize))
            .find(|id| !taken(id));
        if let Some(id) = free {
            return Ok(id);
        }
    }
    Err(StoreError::IdSpaceExhausted {
        prefix: prefix.to_string(),
    })
}

impl Store {
    /// Fresh id for `$config/<collection>`, e.g. `gen_id("widgets", "w")`.
    pub fn gen_id(&mut self, collection: &str, prefix: &str) -> Result<String, StoreError> {
        let existing = self
            .root
            .get(dash_topic::CONFIG_ROOT)
            .and_then(|c| c.get(collection))
            .and_then(Value::as_object);
        gen_id(existing, prefix, &mut self.ids, self.config.id_digits)
    }

    /// Creates the minimal dashboard: tab `t00001` holding empty grid
    /// `g00001`. Fails on a config that already has any section.
    ///
    /// This is an initial load, so it is neither recorded for undo nor sent.
    pub fn init_dash(&mut self) -> Result<(), StoreError> {
        if self.config().as_object().is_some_and(|c| !c.is_empty()) {
            return Err(StoreError::AlreadyInitialized);
        }
        let (tab_id, grid_id) = ("t00001", "g00001");
        let tab = to_json("tabs/t00001", &Tab::with_grids(tab_id, vec![grid_id.to_string()]))?;
        let grid = to_json("grids/g00001", &Grid::empty(grid_id))?;
        let payload = json!({
            "dash": { "title": DEFAULT_TITLE, "tabs": [tab_id] },
            "tabs": { tab_id: tab },
            "grids": { grid_id: grid },
            "widgets": {},
            "conn": {},
        });
        let changed = self.merge_config(Some(payload))?;
        info!("initialized empty dashboard");
        self.notify(ChangeOrigin::Local, changed);
        Ok(())
    }

    pub fn tab_by_id(&self, id: &str) -> Result<&Value, StoreError> {
        self.entity_by_id("tabs", "tab", id)
    }

    pub fn grid_by_id(&self, id: &str) -> Result<&Value, StoreError> {
        self.entity_by_id("grids", "grid", id)
    }

    pub fn widget_by_id(&self, id: &str) -> Result<&Value, StoreError> {
        self.entity_by_id("widgets", "widget", id)
    }

    /// Typed copy of a tab.
    pub fn tab(&self, id: &str) -> Result<Tab, StoreError> {
        typed(&format!("tabs/{id}"), self.tab_by_id(id)?)
    }

    pub fn grid(&self, id: &str) -> Result<Grid, StoreError> {
        typed(&format!("grids/{id}"), self.grid_by_id(id)?)
    }

    pub fn widget(&self, id: &str) -> Result<Widget, StoreError> {
        typed(&format!("widgets/{id}"), self.widget_by_id(id)?)
    }

    /// Tab ids in display order.
    pub fn tab_ids(&self) -> Vec<String> {
        id_list(self.config().get("dash").and_then(|d| d.get("tabs")))
    }

    pub fn tab_id_by_ix(&self, ix: usize) -> Result<String, StoreError> {
        let ids = self.tab_ids();
        let id = ids.get(ix).ok_or_else(|| StoreError::bad_index(ix, ids.len()))?;
        self.tab_by_id(id)?;
        Ok(id.clone())
    }

    pub fn grid_id_by_ix(&self, tab_id: &str, ix: usize) -> Result<String, StoreError> {
        let ids = id_list(self.tab_by_id(tab_id)?.get("grids"));
        let id = ids.get(ix).ok_or_else(|| StoreError::bad_index(ix, ids.len()))?;
        self.grid_by_id(id)?;
        Ok(id.clone())
    }

    pub fn widget_id_by_ix(&self, grid_id: &str, ix: usize) -> Result<String, StoreError> {
        let ids = id_list(self.grid_by_id(grid_id)?.get("widgets"));
        let id = ids.get(ix).ok_or_else(|| StoreError::bad_index(ix, ids.len()))?;
        self.widget_by_id(id)?;
        Ok(id.clone())
    }

    pub fn widget_id_by_panel_ix(&self, panel_id: &str, ix: usize) -> Result<String, StoreError> {
        let ids = self.panel_children(panel_id)?;
        let id = ids.get(ix).ok_or_else(|| StoreError::bad_index(ix, ids.len()))?;
        self.widget_by_id(id)?;
        Ok(id.clone())
    }

    /// Looks up `$config/<collection>/<id>` and checks the entity's own `id`
    /// agrees, so stale or hand-edited maps are caught here.
    fn entity_by_id(
        &self,
        collection: &str,
        entity: &'static str,
        id: &str,
    ) -> Result<&Value, StoreError> {
        self.config()
            .get(collection)
            .and_then(|c| c.get(id))
            .filter(|e| e.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::not_found(entity, id))
    }

    /// Child ids of a panel widget; fails for widgets that are not panels.
    pub(crate) fn panel_children(&self, panel_id: &str) -> Result<Vec<String>, StoreError> {
        let panel = self.widget_by_id(panel_id)?;
        if panel.get("kind").and_then(Value::as_str) != Some(crate::schema::PANEL_KIND) {
            return Err(StoreError::not_found("panel", panel_id));
        }
        Ok(id_list(panel.get("static").and_then(|s| s.get("widgets"))))
    }

    /// `ids` plus, recursively, the children of any panels among them.
    /// Ids that do not resolve are skipped.
    pub(crate) fn widget_tree(&self, ids: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<String> = ids.iter().rev().cloned().collect();
        while let Some(id) = stack.pop() {
            if out.contains(&id) || self.widget_by_id(&id).is_err() {
                continue;
            }
            if let Ok(children) = self.panel_children(&id) {
                stack.extend(children.into_iter().rev());
            }
            out.push(id);
        }
        out
    }
}

fn typed<T: DeserializeOwned>(topic: &str, value: &Value) -> Result<T, StoreError> {
    serde_json::from_value(value.clone()).map_err(|err| StoreError::invalid(topic, err))
}

/// Tagline for a multi-property update, naming the keys.
pub(crate) fn update_tagline(entity: &str, id: &str, props: &Map<String, Value>) -> String {
    let keys: Vec<&str> = props.keys().map(String::as_str).collect();
    format!("update {} of {entity} {id}", keys.join(", "))
}

/// Rejects updates that would rename an entity out from under its parents
/// or address something other than one of its properties.
pub(crate) fn check_props(topic: &str, props: &Map<String, Value>) -> Result<(), StoreError> {
    if props.contains_key("id") {
        return Err(StoreError::invalid(topic, "the id of an entity cannot be changed"));
    }
    props.keys().try_for_each(|key| check_key(topic, key))
}

/// A property name must be one non-empty path segment.
pub(crate) fn check_key(topic: &str, key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains('/') {
        return Err(StoreError::invalid(
            topic,
            format!("'{key}' is not a property name"),
        ));
    }
    Ok(())
}
