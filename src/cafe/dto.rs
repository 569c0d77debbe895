use serde::Deserialize;

use super::repo_types::PrayerInfo;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CafeStatusUpdate {
    pub is_open: bool,
    #[serde(default)]
    pub closure_reason: Option<String>,
    #[serde(default)]
    pub custom_message: Option<String>,
    #[serde(default)]
    pub custom_detail: Option<String>,
    /// Kept only when `closure_reason` is `"prayer"`.
    #[serde(default)]
    pub prayer_info: Option<PrayerInfo>,
    #[serde(default)]
    pub saturday_menu_active: bool,
    #[serde(default)]
    pub saturday_menu_items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub item_name: String,
    pub is_available: bool,
}
