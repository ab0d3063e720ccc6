use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Superflow editing: flows, hosts, and per-flow actions.
pub struct SuperflowOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> SuperflowOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn add_action(
        &self,
        flowid: i64,
        action_type: &str,
        actionid: i64,
        source: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/superflow/operations/addAction",
                json!({
                    "flowid": flowid,
                    "type": action_type,
                    "actionid": actionid,
                    "source": source,
                }),
            )
            .await
    }

    pub async fn add_flow(&self, flow_params: Value) -> Result<Value> {
        self.api
            .post(
                "/superflow/operations/addFlow",
                json!({"flowParams": flow_params}),
            )
            .await
    }

    pub async fn add_host(&self, host_params: Value, force: bool) -> Result<Value> {
        self.api
            .post(
                "/superflow/operations/addHost",
                json!({"hostParams": host_params, "force": force}),
            )
            .await
    }

    pub async fn remove_action(&self, id: i64) -> Result<Value> {
        self.api
            .post("/superflow/operations/removeAction", json!({"id": id}))
            .await
    }

    pub async fn remove_flow(&self, id: i64) -> Result<Value> {
        self.api
            .post("/superflow/operations/removeFlow", json!({"id": id}))
            .await
    }

    /// Opens a new working superflow, optionally from a template.
    pub async fn create(&self, template: Option<&str>) -> Result<Value> {
        let mut params = json!({});
        if let Some(template) = template {
            params["template"] = json!(template);
        }
        self.api.post("/superflow/operations/new", params).await
    }

    pub async fn load(&self, template: &str) -> Result<Value> {
        self.api
            .post("/superflow/operations/load", json!({"template": template}))
            .await
    }

    pub async fn save(&self, name: Option<&str>, force: bool) -> Result<Value> {
        let mut params = json!({"force": force});
        if let Some(name) = name {
            params["name"] = json!(name);
        }
        self.api.post("/superflow/operations/save", params).await
    }

    pub async fn save_as(&self, name: &str, force: bool) -> Result<Value> {
        self.api
            .post(
                "/superflow/operations/saveAs",
                json!({"name": name, "force": force}),
            )
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<Value> {
        self.api
            .post("/superflow/operations/delete", json!({"name": name}))
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
                "/superflow/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }

    pub async fn import_resource(
        &self,
        name: &str,
        file: &Path,
        force: bool,
        resource_type: &str,
    ) -> Result<Value> {
        self.api
            .import(
                "/superflow/operations/importResource",
                file,
                json!({
                    "name": name,
                    "filename": file.to_string_lossy(),
                    "force": force,
                    "type": resource_type,
                }),
            )
            .await
    }

    pub async fn get_action_choices(&self, id: i64) -> Result<Value> {
        self.api
            .post(
                "/superflow/actions/operations/getActionChoices",
                json!({"id": id}),
            )
            .await
    }

    pub async fn get_action_info(&self, id: i64) -> Result<Value> {
        self.api
            .post(
                "/superflow/actions/operations/getActionInfo",
                json!({"id": id}),
            )
            .await
    }

    pub async fn get_canned_flows(&self) -> Result<Value> {
        self.api
            .post("/superflow/flows/operations/getCannedFlows", json!({}))
            .await
    }

    pub async fn get_flow_choices(&self, id: i64, name: &str) -> Result<Value> {
        self.api
            .post(
                "/superflow/flows/operations/getFlowChoices",
                json!({"id": id, "name": name}),
            )
            .await
    }
}
