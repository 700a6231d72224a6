use std::time::Duration;

use dash_util::digits::MAX_WIDTH;
use serde::de::Error as _;
use serde::Deserialize;

use crate::error::StoreError;

/// Tunables of a [`Store`](crate::Store).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use dash_store::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{"undo_capacity": 25}"#).unwrap();
/// assert_eq!(config.undo_capacity, 25);
/// assert_eq!(config.coalesce_window_secs, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Maximum number of undo entries kept.
    pub undo_capacity: usize,
    /// Same-tagline batches pushed within this many seconds merge into one
    /// undo entry.
    pub coalesce_window_secs: u64,
    /// Width of the numeric suffix of generated entity ids.
    pub id_digits: u32,
    /// Seed for id generation; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            undo_capacity: 10,
            coalesce_window_secs: 60,
            id_digits: 5,
            seed: None,
        }
    }
}

impl StoreConfig {
    /// Parses a config document. `id_digits` must be within `1..=19`.
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let config: Self = serde_json::from_str(text).map_err(StoreError::Config)?;
        if !(1..=MAX_WIDTH).contains(&config.id_digits) {
            return Err(StoreError::Config(serde_json::Error::custom(format!(
                "id_digits must be between 1 and {MAX_WIDTH}, got {}",
                config.id_digits
            ))));
        }
        Ok(config)
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_secs(self.coalesce_window_secs)
    }
}
