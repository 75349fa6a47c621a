use serde_json::json;

use crate::api::envelope::Envelope;

pub async fn health_check() -> Envelope<serde_json::Value> {
    Envelope::ok(json!({ "status": "ok" }))
}
