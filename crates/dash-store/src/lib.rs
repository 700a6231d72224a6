//! Dashboard configuration store.
//!
//! The store holds one JSON document with two namespaces: `$config` (the
//! dashboard layout: `dash`, `tabs`, `grids`, `widgets`, `conn`) and `sd`
//! (live server data bound to widgets). On top of it sit:
//!
//! - the mutation primitive [`Store::insert_data`], used for inbound server
//!   messages,
//! - the undo-recording batch engine [`Store::q_mutation`], which forwards a
//!   whole-entity snapshot of every touched entity to a [`ServerSync`],
//! - the entity repository (`add_tab`, `delete_grid`, `add_widget`, ...),
//!   which keeps tab → grid → widget references intact.
//!
//! ```
//! use dash_store::Store;
//!
//! let mut store = Store::new();
//! store.init_dash().unwrap();
//! let ix = store.add_widget("g00001", "Stat").unwrap();
//! assert_eq!(ix, 0);
//! store.perform_undo().unwrap();
//! assert_eq!(store.grid_by_id("g00001").unwrap()["widgets"], serde_json::json!([]));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod mutation;
pub mod repository;
pub mod schema;
pub mod store;
pub mod sync;
pub mod undo;

pub use config::StoreConfig;
pub use error::{ErrorKind, StoreError};
pub use events::{ChangeEvent, ChangeOrigin};
pub use mutation::{scope_of, Mutation};
pub use repository::gen_id;
pub use schema::{Grid, Tab, TabBody, TabKind, Which, Widget};
pub use store::Store;
pub use sync::{ctrl_message, RecordingSync, RequestTracker, ServerSync, SyncMessage};
pub use undo::{UndoBuffer, UndoEntry};

pub use dash_util::{Clock, ManualClock, SystemClock};
