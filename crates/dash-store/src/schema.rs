//! Typed views of the `$config` entities.
//!
//! The store keeps raw JSON so properties it does not know about survive a
//! round trip; these structs are for building new entities and for callers
//! that want strong types when reading. Unknown grid and widget properties
//! land in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

pub const DEFAULT_TITLE: &str = "FlexDash";
pub const DEFAULT_TAB_ICON: &str = "view-dashboard";
pub const IFRAME_TAB_ICON: &str = "web";
pub const DEFAULT_GRID_KIND: &str = "FixedGrid";
pub const PANEL_KIND: &str = "Panel";

/// `$config/tabs/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub body: TabBody,
}

/// What a tab shows: a column of grids, or an embedded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TabBody {
    Grids { grids: Vec<String> },
    Frame { url: String, slot: String },
}

/// `$config/grids/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub widgets: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `$config/widgets/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub kind: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(rename = "static", default)]
    pub static_props: Map<String, Value>,
    /// Property name to the server-data topic feeding it.
    #[serde(default)]
    pub dynamic: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kinds accepted by [`Store::add_tab`](crate::Store::add_tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Grid,
    Iframe,
}

impl TabKind {
    pub fn parse(kind: &str) -> Result<Self, StoreError> {
        match kind {
            "grid" => Ok(TabKind::Grid),
            "iframe" => Ok(TabKind::Iframe),
            other => Err(StoreError::UnknownTabKind(other.to_string())),
        }
    }
}

/// Which property map of a widget to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    Static,
    Dynamic,
}

impl Which {
    pub fn as_str(self) -> &'static str {
        match self {
            Which::Static => "static",
            Which::Dynamic => "dynamic",
        }
    }
}

impl Tab {
    pub fn with_grids(id: &str, grids: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            icon: DEFAULT_TAB_ICON.to_string(),
            title: None,
            body: TabBody::Grids { grids },
        }
    }

    pub fn iframe(id: &str) -> Self {
        Self {
            id: id.to_string(),
            icon: IFRAME_TAB_ICON.to_string(),
            title: None,
            body: TabBody::Frame {
                url: String::new(),
                slot: "a".to_string(),
            },
        }
    }

    pub fn grids(&self) -> &[String] {
        match &self.body {
            TabBody::Grids { grids } => grids,
            TabBody::Frame { .. } => &[],
        }
    }
}

impl Grid {
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: DEFAULT_GRID_KIND.to_string(),
            title: None,
            widgets: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Widget {
    /// A 1x1 widget titled after its kind with nothing bound.
    pub fn new(id: &str, kind: &str) -> Self {
        let mut static_props = Map::new();
        static_props.insert("title".to_string(), Value::String(kind.to_string()));
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            rows: 1,
            cols: 1,
            static_props,
            dynamic: Map::new(),
            output: None,
            extra: Map::new(),
        }
    }

    pub fn is_panel(&self) -> bool {
        self.kind == PANEL_KIND
    }

    /// Children of a panel widget.
    pub fn panel_widgets(&self) -> Vec<String> {
        id_list(self.static_props.get("widgets"))
    }
}

/// String ids held in a JSON array; anything else reads as empty.
pub(crate) fn id_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Serializes an entity that is about to be written at `topic`.
pub(crate) fn to_json<T: Serialize>(topic: &str, entity: &T) -> Result<Value, StoreError> {
    serde_json::to_value(entity).map_err(|err| StoreError::invalid(topic, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_widget_shape() {
        let w = to_json("widgets/w00001", &Widget::new("w00001", "Stat")).unwrap();
        assert_eq!(
            w,
            json!({
                "id": "w00001", "kind": "Stat", "rows": 1, "cols": 1,
                "static": {"title": "Stat"}, "dynamic": {}
            })
        );
    }

    #[test]
    fn tab_variants_parse() {
        let grid_tab: Tab =
            serde_json::from_value(json!({"id": "t1", "icon": "x", "grids": ["g1"]})).unwrap();
        assert_eq!(grid_tab.grids(), ["g1".to_string()]);

        let frame_tab: Tab = serde_json::from_value(
            json!({"id": "t2", "icon": "web", "title": "docs", "url": "http://x", "slot": "a"}),
        )
        .unwrap();
        assert!(matches!(frame_tab.body, TabBody::Frame { .. }));
        assert_eq!(frame_tab.title.as_deref(), Some("docs"));
    }

    #[test]
    fn unknown_props_survive() {
        let raw = json!({"id": "g1", "kind": "FixedGrid", "widgets": [], "color": "red"});
        let grid: Grid = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(grid.extra["color"], json!("red"));
        assert_eq!(to_json("grids/g1", &grid).unwrap(), raw);
    }

    #[test]
    fn unknown_tab_kind() {
        assert!(matches!(TabKind::parse("pie"), Err(StoreError::UnknownTabKind(k)) if k == "pie"));
    }
}
