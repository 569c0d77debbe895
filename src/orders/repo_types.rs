use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::clock::{day, stamp};
use crate::rights::repo_types::DeviceInfo;
use crate::rights::slots::Slot;

/// `activeOrders/{orderId}`: placed, not yet handed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOrder {
    pub order_id: String,
    pub order_number: u32,
    pub guest_name: String,
    pub phone: String,
    pub device_id: String,
    #[serde(default)]
    pub device_info: DeviceInfo,
    pub item: String,
    pub slot: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    #[serde(with = "stamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "day")]
    pub date: Date,
}

/// `dailyOrders/{date}/orders/{orderId}`; written once, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    #[serde(flatten)]
    pub order: ActiveOrder,
    #[serde(with = "stamp")]
    pub completed_at: OffsetDateTime,
}

/// `dailyOrders/{date}`, present once anything was archived that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveMarker {
    #[serde(with = "day")]
    pub date: Date,
}

/// `dailyCounters/{date}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounter {
    #[serde(default)]
    pub last_order_number: u32,
    #[serde(with = "day")]
    pub date: Date,
    #[serde(with = "stamp")]
    pub last_updated: OffsetDateTime,
}
