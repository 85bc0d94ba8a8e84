use serde::{Deserialize, Serialize};

/// Payload handed to the email queue collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailQueuePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: i64,
    /// JSON-encoded [`TradeNotice`]
    pub information: String,
}

/// Human-readable details of one executed leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeNotice {
    #[serde(rename = "type")]
    pub kind: String,
    pub type_uppercase: String,
    pub amount: String,
    pub pair: String,
    pub symbol: String,
    pub price: String,
    pub order_id: String,
    pub total: String,
    pub date_time: String,
}
