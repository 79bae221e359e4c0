use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AddSessionRequest {
    pub game: Option<String>,
    pub players: Option<Vec<String>>,
    pub winner: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSessionRequest {
    pub session_id: Option<String>,
}
