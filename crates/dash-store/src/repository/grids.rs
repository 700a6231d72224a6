use serde_json::{Map, Value};

use super::{check_props, update_tagline};
use crate::error::StoreError;
use crate::mutation::Mutation;
use crate::schema::{id_list, to_json, Grid};
use crate::store::Store;

impl Store {
    /// Appends an empty grid to a tab and returns its index in the tab.
    pub fn add_grid(&mut self, tab_id: &str) -> Result<usize, StoreError> {
        let mut grids = self.tab_grids(tab_id)?;
        let grid_id = self.gen_id("grids", "g")?;
        let ix = grids.len();
        grids.push(grid_id.clone());
        let topic = format!("grids/{grid_id}");
        let grid = to_json(&topic, &Grid::empty(&grid_id))?;

        let batch = vec![
            Mutation::set(topic, grid),
            Mutation::set(format!("tabs/{tab_id}/grids"), Value::from(grids)),
        ];
        self.q_mutation(Some("add grid"), batch)?;
        Ok(ix)
    }

    /// Removes the grid at `ix` of a tab together with its widgets.
    pub fn delete_grid(&mut self, tab_id: &str, ix: usize) -> Result<(), StoreError> {
        let grid_id = self.grid_id_by_ix(tab_id, ix)?;
        let widgets = id_list(self.grid_by_id(&grid_id)?.get("widgets"));
        let widgets = self.widget_tree(&widgets);

        let mut grids = self.tab_grids(tab_id)?;
        grids.remove(ix);
        let mut batch = Vec::with_capacity(2 + widgets.len());
        batch.push(Mutation::set(format!("tabs/{tab_id}/grids"), Value::from(grids)));
        batch.push(Mutation::delete(format!("grids/{grid_id}")));
        batch.extend(widgets.iter().map(|w| Mutation::delete(format!("widgets/{w}"))));

        self.q_mutation(Some("delete grid"), batch)
    }

    pub fn update_grid(&mut self, grid_id: &str, props: &Map<String, Value>) -> Result<(), StoreError> {
        self.grid_by_id(grid_id)?;
        check_props(&format!("grids/{grid_id}"), props)?;
        let batch = props
            .iter()
            .map(|(k, v)| Mutation::set(format!("grids/{grid_id}/{k}"), v.clone()))
            .collect();
        self.q_mutation(Some(&update_tagline("grid", grid_id, props)), batch)
    }

    /// Grid ids of a tab; iframe tabs have none to add to.
    fn tab_grids(&self, tab_id: &str) -> Result<Vec<String>, StoreError> {
        let tab = self.tab_by_id(tab_id)?;
        match tab.get("grids") {
            Some(grids) if grids.is_array() => Ok(id_list(Some(grids))),
            other => Err(StoreError::NotContainer {
                topic: format!("tabs/{tab_id}/grids"),
                found: other.map_or("nothing", dash_topic::kind_of),
            }),
        }
    }
}
