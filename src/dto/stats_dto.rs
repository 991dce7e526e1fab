use serde::Deserialize;

pub const DEFAULT_ACTIVITY_DAYS: u32 = 7;
pub const MAX_ACTIVITY_DAYS: u32 = 90;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityQuery {
    pub days: Option<u32>,
}

impl ActivityQuery {
    /// Length of the look-back window in days.
    pub fn window_days(&self) -> u32 {
        self.days
            .unwrap_or(DEFAULT_ACTIVITY_DAYS)
            .min(MAX_ACTIVITY_DAYS)
    }
}
