use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Stored application profiles.
pub struct AppProfileOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> AppProfileOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    /// Adds superflows (an array of `{superflow, weight}` objects) to the
    /// working profile.
    pub async fn add(&self, add: Value) -> Result<Value> {
        self.api
            .post("/appProfile/operations/add", json!({"add": add}))
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<Value> {
        self.api
            .post("/appProfile/operations/delete", json!({"name": name}))
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
                "/appProfile/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }

    pub async fn export_app_profile(
        &self,
        name: &str,
        attachments: bool,
        file: &Path,
    ) -> Result<()> {
        self.api
            .export(
                "/appProfile/operations/exportAppProfile",
                file,
                json!({"name": name, "attachments": attachments}),
            )
            .await
    }

    pub async fn import_app_profile(&self, name: &str, file: &Path, force: bool) -> Result<Value> {
        self.api
            .import(
                "/appProfile/operations/importAppProfile",
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
