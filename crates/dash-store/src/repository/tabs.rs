use serde_json::{Map, Value};

use super::{check_props, update_tagline};
use crate::error::StoreError;
use crate::mutation::Mutation;
use crate::schema::{id_list, to_json, Grid, Tab, TabKind};
use crate::store::Store;

impl Store {
    /// Appends a new tab and returns its index in `dash.tabs`.
    ///
    /// `"grid"` tabs come with one empty grid; `"iframe"` tabs carry a
    /// `url`/`slot` instead of grids.
    pub fn add_tab(&mut self, kind: &str) -> Result<usize, StoreError> {
        let kind = TabKind::parse(kind)?;
        let tab_id = self.gen_id("tabs", "t")?;
        let mut batch = Vec::with_capacity(3);
        let tab = match kind {
            TabKind::Grid => {
                let grid_id = self.gen_id("grids", "g")?;
                let topic = format!("grids/{grid_id}");
                let grid = to_json(&topic, &Grid::empty(&grid_id))?;
                batch.push(Mutation::set(topic, grid));
                Tab::with_grids(&tab_id, vec![grid_id])
            }
            TabKind::Iframe => Tab::iframe(&tab_id),
        };
        let topic = format!("tabs/{tab_id}");
        let tab = to_json(&topic, &tab)?;
        batch.push(Mutation::set(topic, tab));

        let mut tabs = self.tab_ids();
        let ix = tabs.len();
        tabs.push(tab_id);
        batch.push(Mutation::set("dash/tabs", Value::from(tabs)));

        self.q_mutation(Some("add tab"), batch)?;
        Ok(ix)
    }

    /// Removes the tab at `ix` together with its grids and their widgets.
    pub fn delete_tab(&mut self, ix: usize) -> Result<(), StoreError> {
        let tab_id = self.tab_id_by_ix(ix)?;
        let grids = id_list(self.tab_by_id(&tab_id)?.get("grids"));
        let mut widgets = Vec::new();
        for grid_id in &grids {
            widgets.extend(id_list(self.grid_by_id(grid_id)?.get("widgets")));
        }
        let widgets = self.widget_tree(&widgets);

        let mut tabs = self.tab_ids();
        tabs.remove(ix);
        let mut batch = Vec::with_capacity(2 + grids.len() + widgets.len());
        batch.push(Mutation::set("dash/tabs", Value::from(tabs)));
        batch.push(Mutation::delete(format!("tabs/{tab_id}")));
        batch.extend(grids.iter().map(|g| Mutation::delete(format!("grids/{g}"))));
        batch.extend(widgets.iter().map(|w| Mutation::delete(format!("widgets/{w}"))));

        self.q_mutation(Some("delete tab"), batch)
    }

    /// Sets each key of `props` on the tab, as one undo step.
    pub fn update_tab(&mut self, tab_id: &str, props: &Map<String, Value>) -> Result<(), StoreError> {
        self.tab_by_id(tab_id)?;
        check_props(&format!("tabs/{tab_id}"), props)?;
        let batch = props
            .iter()
            .map(|(k, v)| Mutation::set(format!("tabs/{tab_id}/{k}"), v.clone()))
            .collect();
        self.q_mutation(Some(&update_tagline("tab", tab_id, props)), batch)
    }
}
