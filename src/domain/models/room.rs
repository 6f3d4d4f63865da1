use serde::{Deserialize, Serialize};

use crate::domain::Identified;

pub const ROOMS_RESOURCE: &str = "rooms";

/// Practice / lesson room, as listed by the room multi-select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub has_piano: bool,
}

impl Identified for Room {
    fn identity(&self) -> String {
        self.id.to_string()
    }
}
