use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clock::stamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerInfo {
    pub name: String,
    pub start_time: String,
}

/// `cafeStatus/current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CafeStatus {
    pub is_open: bool,
    #[serde(with = "stamp")]
    pub last_updated: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prayer_info: Option<PrayerInfo>,
    #[serde(default)]
    pub saturday_menu_active: bool,
    #[serde(default)]
    pub saturday_menu_items: Vec<String>,
}

impl CafeStatus {
    pub fn open_since(at: OffsetDateTime) -> Self {
        Self {
            is_open: true,
            last_updated: at,
            closure_reason: None,
            custom_message: None,
            custom_detail: None,
            prayer_info: None,
            saturday_menu_active: false,
            saturday_menu_items: Vec::new(),
        }
    }
}

/// `stockStatus/current`; items missing from the map are in stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDoc {
    #[serde(default)]
    pub items: BTreeMap<String, bool>,
    #[serde(with = "stamp")]
    pub last_updated: OffsetDateTime,
}
