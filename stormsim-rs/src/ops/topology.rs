use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Chassis topology: port reservations, fanout modes, capture export.
pub struct TopologyOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> TopologyOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    /// Reserves ports. `reservation` is an array of
    /// `{slot, port, group}` objects.
    pub async fn reserve(&self, reservation: Value, force: bool) -> Result<Value> {
        self.api
            .post(
                "/topology/operations/reserve",
                json!({"reservation": reservation, "force": force}),
            )
            .await
    }

    /// Releases ports. `ports` is an array of `{slot, port}` objects.
    pub async fn unreserve(&self, ports: Value) -> Result<Value> {
        self.api
            .post(
                "/topology/operations/unreserve",
                json!({"unreservation": ports}),
            )
            .await
    }

    pub async fn get_fanout_modes(&self, card_id: i64) -> Result<Value> {
        self.api
            .post(
                "/topology/operations/getFanoutModes",
                json!({"cardId": card_id}),
            )
            .await
    }

    pub async fn export_capture(&self, file: &Path, args: Value) -> Result<()> {
        self.api
            .export("/topology/operations/exportCapture", file, json!({"args": args}))
            .await
    }
}
