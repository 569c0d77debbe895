use std::fmt;

use serde::{Deserialize, Serialize};

/// Named ordering window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "Open Order")]
    Open,
    #[serde(rename = "18:00-20:00")]
    Early,
    #[serde(rename = "20:00-23:00")]
    Late,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Open, Slot::Early, Slot::Late];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Open => "Open Order",
            Slot::Early => "18:00-20:00",
            Slot::Late => "20:00-23:00",
        }
    }

    pub fn time_range(self) -> &'static str {
        match self {
            Slot::Open => "Anytime",
            Slot::Early | Slot::Late => self.as_str(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// [18,20) and [20,23) are named windows; every other hour is the open slot.
pub fn resolve_slot(hour: u8) -> Slot {
    match hour {
        18..=19 => Slot::Early,
        20..=22 => Slot::Late,
        _ => Slot::Open,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub name: Slot,
    pub available: bool,
    pub time_range: &'static str,
}

/// Which slot is live at `hour`, independent of any customer.
pub fn available_slots(hour: u8) -> Vec<SlotAvailability> {
    let live = resolve_slot(hour);
    Slot::ALL
        .into_iter()
        .map(|slot| SlotAvailability {
            name: slot,
            available: slot == live,
            time_range: slot.time_range(),
        })
        .collect()
}
