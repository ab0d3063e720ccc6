use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Stored strike lists.
pub struct StrikeListOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> StrikeListOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    /// Adds strikes (an array of `{id}` objects) to the working list, or to
    /// `to_list` when given.
    pub async fn add(&self, strikes: Value, validate: bool, to_list: Option<&str>) -> Result<Value> {
        let mut params = json!({"strike": strikes, "validate": validate});
        if let Some(to_list) = to_list {
            params["toList"] = json!(to_list);
        }
        self.api.post("/strikeList/operations/add", params).await
    }

    pub async fn remove(&self, strikes: Value) -> Result<Value> {
        self.api
            .post("/strikeList/operations/remove", json!({"strike": strikes}))
            .await
    }

    /// Opens a new working strike list, optionally from a template.
    pub async fn create(&self, template: Option<&str>) -> Result<Value> {
        let mut params = json!({});
        if let Some(template) = template {
            params["template"] = json!(template);
        }
        self.api.post("/strikeList/operations/new", params).await
    }

    pub async fn load(&self, template: &str) -> Result<Value> {
        self.api
            .post("/strikeList/operations/load", json!({"template": template}))
            .await
    }

    pub async fn save(&self, name: Option<&str>, force: bool) -> Result<Value> {
        let mut params = json!({"force": force});
        if let Some(name) = name {
            params["name"] = json!(name);
        }
        self.api.post("/strikeList/operations/save", params).await
    }

    pub async fn save_as(&self, name: &str, force: bool) -> Result<Value> {
        self.api
            .post(
                "/strikeList/operations/saveAs",
                json!({"name": name, "force": force}),
            )
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<Value> {
        self.api
            .post("/strikeList/operations/delete", json!({"name": name}))
            .await
    }

    pub async fn search(
        &self,
        search_string: &str,
        limit: u32,
        sort: &str,
        sortorder: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/strikeList/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }

    pub async fn export_strike_list(&self, name: &str, file: &Path) -> Result<()> {
        self.api
            .export(
                "/strikeList/operations/exportStrikeList",
                file,
                json!({"name": name}),
            )
            .await
    }

    pub async fn import_strike_list(&self, name: &str, file: &Path, force: bool) -> Result<Value> {
        self.api
            .import(
                "/strikeList/operations/importStrikeList",
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
