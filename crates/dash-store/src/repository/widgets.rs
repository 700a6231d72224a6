use serde_json::{Map, Value};

use super::{check_key, check_props, update_tagline};
use crate::error::StoreError;
use crate::mutation::Mutation;
use crate::schema::{id_list, to_json, Which, Widget};
use crate::store::Store;

/// Something that holds an ordered list of widget ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container<'a> {
    Grid(&'a str),
    Panel(&'a str),
}

impl<'a> Container<'a> {
    /// Grid ids start with `g`; everything else is taken to be a panel.
    fn of(id: &'a str) -> Self {
        if id.starts_with('g') {
            Container::Grid(id)
        } else {
            Container::Panel(id)
        }
    }

    fn list_path(self) -> String {
        match self {
            Container::Grid(id) => format!("grids/{id}/widgets"),
            Container::Panel(id) => format!("widgets/{id}/static/widgets"),
        }
    }
}

impl Store {
    /// Adds a widget of `kind` at the end of a grid; returns its index.
    pub fn add_widget(&mut self, grid_id: &str, kind: &str) -> Result<usize, StoreError> {
        self.add_to(Container::Grid(grid_id), kind)
    }

    /// Adds a widget of `kind` at the end of a panel; returns its index.
    pub fn add_panel_widget(&mut self, panel_id: &str, kind: &str) -> Result<usize, StoreError> {
        self.add_to(Container::Panel(panel_id), kind)
    }

    pub fn delete_widget(&mut self, grid_id: &str, ix: usize) -> Result<(), StoreError> {
        let widget_id = self.widget_id_by_ix(grid_id, ix)?;
        self.remove_from(Container::Grid(grid_id), ix, &widget_id)
    }

    pub fn delete_panel_widget(&mut self, panel_id: &str, ix: usize) -> Result<(), StoreError> {
        let widget_id = self.widget_id_by_panel_ix(panel_id, ix)?;
        self.remove_from(Container::Panel(panel_id), ix, &widget_id)
    }

    /// Moves a widget from one grid or panel to the end of another and
    /// returns its new index there.
    pub fn move_widget(
        &mut self,
        widget_id: &str,
        src_id: &str,
        dest_id: &str,
    ) -> Result<usize, StoreError> {
        self.widget_by_id(widget_id)?;
        let (src, dest) = (Container::of(src_id), Container::of(dest_id));
        let mut from = self.widget_list(src)?;
        let pos = from
            .iter()
            .position(|w| w == widget_id)
            .ok_or_else(|| StoreError::not_found("widget", widget_id))?;
        if src == dest {
            return Ok(pos);
        }
        if let Container::Panel(panel_id) = dest {
            // The widget itself or anything nested in it.
            if self.widget_tree(&[widget_id.to_string()]).iter().any(|w| w == panel_id) {
                return Err(StoreError::invalid(
                    dest.list_path(),
                    "a panel cannot contain itself",
                ));
            }
        }
        let mut to = self.widget_list(dest)?;
        from.remove(pos);
        let ix = to.len();
        to.push(widget_id.to_string());

        let batch = vec![
            Mutation::set(src.list_path(), Value::from(from)),
            Mutation::set(dest.list_path(), Value::from(to)),
        ];
        self.q_mutation(Some("move widget"), batch)?;
        Ok(ix)
    }

    pub fn update_widget(
        &mut self,
        widget_id: &str,
        props: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.widget_by_id(widget_id)?;
        check_props(&format!("widgets/{widget_id}"), props)?;
        let batch = props
            .iter()
            .map(|(k, v)| Mutation::set(format!("widgets/{widget_id}/{k}"), v.clone()))
            .collect();
        self.q_mutation(Some(&update_tagline("widget", widget_id, props)), batch)
    }

    /// Sets (or, with `None`, removes) one `static` or `dynamic` property.
    pub fn update_widget_prop(
        &mut self,
        widget_id: &str,
        which: Which,
        prop: &str,
        value: Option<Value>,
    ) -> Result<(), StoreError> {
        self.widget_by_id(widget_id)?;
        let which = which.as_str();
        check_key(&format!("widgets/{widget_id}/{which}"), prop)?;
        let mutation = Mutation {
            path: format!("widgets/{widget_id}/{which}/{prop}"),
            value,
        };
        let tagline = format!("update {prop} of widget {widget_id}");
        self.q_mutation(Some(&tagline), vec![mutation])
    }

    fn widget_list(&self, container: Container<'_>) -> Result<Vec<String>, StoreError> {
        match container {
            Container::Grid(id) => Ok(id_list(self.grid_by_id(id)?.get("widgets"))),
            Container::Panel(id) => self.panel_children(id),
        }
    }

    fn add_to(&mut self, container: Container<'_>, kind: &str) -> Result<usize, StoreError> {
        let mut ids = self.widget_list(container)?;
        let widget_id = self.gen_id("widgets", "w")?;
        let ix = ids.len();
        ids.push(widget_id.clone());
        let topic = format!("widgets/{widget_id}");
        let widget = to_json(&topic, &Widget::new(&widget_id, kind))?;

        let batch = vec![
            Mutation::set(topic, widget),
            Mutation::set(container.list_path(), Value::from(ids)),
        ];
        self.q_mutation(Some("add widget"), batch)?;
        Ok(ix)
    }

    fn remove_from(
        &mut self,
        container: Container<'_>,
        ix: usize,
        widget_id: &str,
    ) -> Result<(), StoreError> {
        let mut ids = self.widget_list(container)?;
        ids.remove(ix);
        let doomed = self.widget_tree(&[widget_id.to_string()]);

        let mut batch = Vec::with_capacity(1 + doomed.len());
        batch.push(Mutation::set(container.list_path(), Value::from(ids)));
        batch.extend(doomed.iter().map(|w| Mutation::delete(format!("widgets/{w}"))));
        self.q_mutation(Some("delete widget"), batch)
    }
}
