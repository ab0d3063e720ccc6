use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Stored network (neighborhood) configurations.
pub struct NetworkOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> NetworkOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn search(
        &self,
        search_string: &str,
        userid: &str,
        class: &str,
        sortorder: &str,
        sort: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value> {
        self.api
            .post(
                "/network/operations/search",
                json!({
                    "searchString": search_string,
                    "userid": userid,
                    "class": class,
                    "sortorder": sortorder,
                    "sort": sort,
                    "limit": limit,
                    "offset": offset,
                }),
            )
            .await
    }

    /// Loads a stored network configuration as the working network.
    pub async fn load(&self, template: &str) -> Result<Value> {
        self.api
            .post("/network/operations/load", json!({"template": template}))
            .await
    }

    pub async fn export_network(&self, name: &str, attachments: bool, file: &Path) -> Result<()> {
        self.api
            .export(
                "/network/operations/exportNetwork",
                file,
                json!({"name": name, "attachments": attachments}),
            )
            .await
    }

    pub async fn import_network(&self, name: &str, file: &Path, force: bool) -> Result<Value> {
        self.api
            .import(
                "/network/operations/importNetwork",
                file,
                json!({
                    "name": name,
                    "filename": file.to_string_lossy(),
                    "force": force,
                }),
            )
            .await
    }
}
