use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsQuery {
    pub phone: String,
    pub device_id: String,
}
