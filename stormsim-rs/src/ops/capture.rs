use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Stored packet captures.
pub struct CaptureOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> CaptureOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn import_capture(&self, name: &str, file: &Path, force: bool) -> Result<Value> {
        self.api
            .import(
                "/capture/operations/importCapture",
                file,
                json!({"name": name, "force": force}),
            )
            .await
    }

    pub async fn search(
        &self,
        search_string: &str,
        limit: &str,
        sort: &str,
        sortorder: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/capture/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }
}
