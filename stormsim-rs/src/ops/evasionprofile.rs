use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Stored evasion profiles and their strike options.
pub struct EvasionProfileOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> EvasionProfileOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_strike_options(&self) -> Result<Value> {
        self.api
            .post(
                "/evasionProfile/StrikeOptions/operations/getStrikeOptions",
                json!({}),
            )
            .await
    }

    pub async fn load(&self, template: &str) -> Result<Value> {
        self.api
            .post(
                "/evasionProfile/operations/load",
                json!({"template": template}),
            )
            .await
    }

    /// Opens a new working evasion profile, optionally from a template.
    pub async fn create(&self, template: Option<&str>) -> Result<Value> {
        let mut params = json!({});
        if let Some(template) = template {
            params["template"] = json!(template);
        }
        self.api.post("/evasionProfile/operations/new", params).await
    }

    pub async fn save(&self, name: Option<&str>, force: bool) -> Result<Value> {
        let mut params = json!({"force": force});
        if let Some(name) = name {
            params["name"] = json!(name);
        }
        self.api.post("/evasionProfile/operations/save", params).await
    }

    pub async fn save_as(&self, name: &str, force: bool) -> Result<Value> {
        self.api
            .post(
                "/evasionProfile/operations/saveAs",
                json!({"name": name, "force": force}),
            )
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<Value> {
        self.api
            .post("/evasionProfile/operations/delete", json!({"name": name}))
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
                "/evasionProfile/operations/search",
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
