use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Stored load profiles.
pub struct LoadProfileOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> LoadProfileOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_new(&self, load_profile: &str) -> Result<Value> {
        self.api
            .post(
                "/loadprofile/operations/createNew",
                json!({"loadProfile": load_profile}),
            )
            .await
    }

    pub async fn load(&self, template: &str) -> Result<Value> {
        self.api
            .post(
                "/loadprofile/operations/load",
                json!({"template": template}),
            )
            .await
    }

    pub async fn save(&self) -> Result<Value> {
        self.api.post("/loadprofile/operations/save", json!({})).await
    }

    pub async fn save_as(&self, name: &str) -> Result<Value> {
        self.api
            .post("/loadprofile/operations/saveAs", json!({"name": name}))
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<Value> {
        self.api
            .post("/loadprofile/operations/delete", json!({"name": name}))
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
                "/loadprofile/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }

    pub async fn search_dynamic(
        &self,
        search_string: &str,
        limit: &str,
        sort: &str,
        sortorder: &str,
        offset: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/loadprofile/operations/searchDynamic",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                    "offset": offset,
                }),
            )
            .await
    }
}
