use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::clock::stamp;
use crate::rights::repo_types::DeviceInfo;
use crate::rights::slots::Slot;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    // Missing strings decode as empty and are rejected by the service as required fields.
    #[serde(default)]
    pub guest_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub item: String,
    #[serde(default, alias = "fcmToken")]
    pub push_token: Option<String>,
    /// Anything that is not a whole number is dropped; values outside 1..=5 are ignored later.
    #[serde(default, deserialize_with = "whole_number")]
    pub rating: Option<i64>,
    #[serde(flatten)]
    pub device_info: DeviceInfo,
}

fn whole_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: String,
    pub order_number: u32,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderNotice {
    pub id: String,
    pub order_number: u32,
    pub guest_name: String,
    pub phone: String,
    pub item: String,
    pub slot: Slot,
    #[serde(with = "stamp")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReadyNotice {
    pub id: String,
    pub order_number: u32,
    pub guest_name: String,
    pub item: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickedUpNotice {
    pub id: String,
}

/// Returned to staff after a hand-over; enough to notify the customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub order_number: u32,
    pub item: String,
    pub guest_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}
