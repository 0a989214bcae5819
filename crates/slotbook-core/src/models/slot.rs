use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(alias = "_id", deserialize_with = "super::id_from_any")]
    pub id: String,
    #[serde(rename = "startTime", alias = "start_time", alias = "start")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime", alias = "end_time", alias = "end")]
    pub end_time: DateTime<Utc>,
}

impl Slot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}
