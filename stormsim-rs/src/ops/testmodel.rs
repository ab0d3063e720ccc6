use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Operations on stored test models and the working model's components.
pub struct TestModelOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> TestModelOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    /// Loads a stored model as the session's working model.
    pub async fn load(&self, template: &str, validate: bool) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/load",
                json!({"template": template, "validate": validate}),
            )
            .await
    }

    /// Launches a run of `modelname` in the given concurrency group. The
    /// response carries the appliance-assigned `runid`.
    pub async fn run(&self, modelname: &str, group: u32, allow_malware: bool) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/run",
                json!({
                    "modelname": modelname,
                    "group": group,
                    "allowMalware": allow_malware,
                }),
            )
            .await
    }

    pub async fn stop(&self, runid: i64) -> Result<Value> {
        self.api
            .post("/testmodel/operations/stop", json!({"runid": runid}))
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
                "/testmodel/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }

    pub async fn add(
        &self,
        name: &str,
        component: &str,
        component_type: &str,
        active: bool,
    ) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/add",
                json!({
                    "name": name,
                    "component": component,
                    "type": component_type,
                    "active": active,
                }),
            )
            .await
    }

    pub async fn save(&self, name: &str, force: bool) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/save",
                json!({"name": name, "force": force}),
            )
            .await
    }

    /// Clones a component template into the working model.
    pub async fn clone_component(
        &self,
        template: &str,
        component_type: &str,
        active: bool,
        label: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/clone",
                json!({
                    "template": template,
                    "type": component_type,
                    "active": active,
                    "label": label,
                }),
            )
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<Value> {
        self.api
            .post("/testmodel/operations/delete", json!({"name": name}))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<Value> {
        self.api
            .post("/testmodel/operations/remove", json!({"id": id}))
            .await
    }

    pub async fn validate(&self, group: &str) -> Result<Value> {
        self.api
            .post("/testmodel/operations/validate", json!({"group": group}))
            .await
    }

    /// Live statistics for a running test. `num_seconds = -1` means the
    /// most recent window.
    pub async fn real_time_stats(
        &self,
        runid: i64,
        rtsgroup: &str,
        num_seconds: i64,
        num_data_points: i64,
        aggregate: &str,
        protocol: &[String],
    ) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/realTimeStats",
                json!({
                    "runid": runid,
                    "rtsgroup": rtsgroup,
                    "numSeconds": num_seconds,
                    "numDataPoints": num_data_points,
                    "aggregate": aggregate,
                    "protocol": protocol,
                }),
            )
            .await
    }

    pub async fn test_component_definition(
        &self,
        name: &str,
        dynamic_enums: bool,
        include_outputs: bool,
    ) -> Result<Value> {
        self.api
            .post(
                "/testmodel/operations/testComponentDefinition",
                json!({
                    "name": name,
                    "dynamicEnums": dynamic_enums,
                    "includeOutputs": include_outputs,
                }),
            )
            .await
    }

    pub async fn export_model(&self, name: &str, attachments: bool, file: &Path) -> Result<()> {
        self.api
            .export(
                "/testmodel/operations/exportModel",
                file,
                json!({"name": name, "attachments": attachments}),
            )
            .await
    }

    pub async fn import_model(&self, name: &str, file: &Path, force: bool) -> Result<Value> {
        self.api
            .import(
                "/testmodel/operations/importModel",
                file,
                json!({
                    "name": name,
                    "filename": file.to_string_lossy(),
                    "force": force,
                }),
            )
            .await
    }

    /// Lists the working model's components.
    pub async fn list_components(&self) -> Result<Value> {
        self.api.get("/testmodel/component", None, &[]).await
    }

    pub async fn get_component(&self, component_id: &str) -> Result<Value> {
        self.api
            .get(&format!("/testmodel/component/{component_id}"), None, &[])
            .await
    }

    pub async fn set_component_label(&self, component_id: &str, label: &str) -> Result<()> {
        self.api
            .patch(
                &format!("/testmodel/component/{component_id}"),
                json!({"label": label}),
            )
            .await
    }

    pub async fn set_component_active(&self, component_id: &str, active: bool) -> Result<()> {
        self.api
            .patch(
                &format!("/testmodel/component/{component_id}"),
                json!({"active": active}),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeApi;

    #[tokio::test]
    async fn run_body_carries_model_group_and_malware_flag() {
        let api = FakeApi::new();
        TestModelOps::new(&api)
            .run("dns-flood", 2, false)
            .await
            .expect("run");
        let bodies = api.bodies_for("POST", "/testmodel/operations/run");
        assert_eq!(
            bodies,
            vec![json!({"modelname": "dns-flood", "group": 2, "allowMalware": false})]
        );
    }

    #[tokio::test]
    async fn component_patch_addresses_the_component_by_id() {
        let api = FakeApi::new();
        TestModelOps::new(&api)
            .set_component_active("comp-3", true)
            .await
            .expect("patch");
        assert_eq!(
            api.bodies_for("PATCH", "/testmodel/component/comp-3"),
            vec![json!({"active": true})]
        );
    }
}
