use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Historical result series for finished runs.
pub struct ResultsOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> ResultsOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_groups(
        &self,
        name: &str,
        dynamic_enums: bool,
        include_outputs: bool,
    ) -> Result<Value> {
        self.api
            .post(
                "/results/operations/getGroups",
                json!({
                    "name": name,
                    "dynamicEnums": dynamic_enums,
                    "includeOutputs": include_outputs,
                }),
            )
            .await
    }

    pub async fn get_historical_result_size(
        &self,
        runid: i64,
        componentid: &str,
        group: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/results/operations/getHistoricalResultSize",
                json!({"runid": runid, "componentid": componentid, "group": group}),
            )
            .await
    }

    pub async fn get_historical_series(
        &self,
        runid: i64,
        componentid: &str,
        dataindex: i64,
        group: &str,
    ) -> Result<Value> {
        self.api
            .post(
                "/results/operations/getHistoricalSeries",
                json!({
                    "runid": runid,
                    "componentid": componentid,
                    "dataindex": dataindex,
                    "group": group,
                }),
            )
            .await
    }
}
