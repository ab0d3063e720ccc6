use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Remote chassis attachment.
pub struct RemoteOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> RemoteOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn connect_chassis(&self, address: &str, remote: &str) -> Result<Value> {
        self.api
            .post(
                "/remote/operations/connectChassis",
                json!({"address": address, "remote": remote}),
            )
            .await
    }

    pub async fn disconnect_chassis(&self, address: &str, port: Option<i64>) -> Result<Value> {
        let mut params = json!({"address": address});
        if let Some(port) = port {
            params["port"] = json!(port);
        }
        self.api
            .post("/remote/operations/disconnectChassis", params)
            .await
    }
}
