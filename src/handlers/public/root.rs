use axum::response::Json;
use serde_json::{json, Value};

/// GET / - Service name, version and endpoint listing
pub async fn get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "FishLedger API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Per-user preferences for the FishLedger inventory platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "settings": "/settings, /api/settings (protected - GET, PUT)",
            }
        }
    }))
}
