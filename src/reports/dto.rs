use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub filter: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
