use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::clock::{day, stamp};
use crate::rights::slots::Slot;

/// Client device fingerprint; unknown parts are left out of the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
}

/// One order recorded against a customer's daily rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsEntry {
    pub order_number: u32,
    pub order_id: String,
    #[serde(with = "stamp")]
    pub placed_at: OffsetDateTime,
    pub slot: Slot,
}

/// `orderRights/{phone}`; only meaningful while `date` is today.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRights {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(with = "day")]
    pub date: Date,
    #[serde(default)]
    pub order_count: u32,
    #[serde(default)]
    pub orders: Vec<RightsEntry>,
    pub device_id: String,
    #[serde(default)]
    pub device_info: DeviceInfo,
    #[serde(with = "stamp")]
    pub last_order_at: OffsetDateTime,
}

/// `dailyDeviceUsage/{deviceId}`: which phone a device ordered for on `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUsage {
    pub device_id: String,
    pub phone: String,
    #[serde(with = "day")]
    pub date: Date,
    #[serde(with = "stamp")]
    pub last_order_at: OffsetDateTime,
    #[serde(default)]
    pub device_info: DeviceInfo,
}
