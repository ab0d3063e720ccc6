use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Statistic definitions and per-run statistic values.
pub struct StatisticsOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> StatisticsOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_stats_definitions(&self) -> Result<Value> {
        self.api
            .post("/statistics/operations/getStatsDefinitions", json!({}))
            .await
    }

    pub async fn get_statistics_by_type(&self, stat_type: &str) -> Result<Value> {
        self.api
            .post(
                "/statistics/operations/getStatisticsByType",
                json!({"type": stat_type}),
            )
            .await
    }

    pub async fn get_statistic_values(
        &self,
        component_id: &str,
        statistic_name: &str,
        run_id: i64,
    ) -> Result<Value> {
        self.api
            .post(
                "/statistics/operations/getStatisticValues",
                json!({
                    "componentId": component_id,
                    "statisticName": statistic_name,
                    "runId": run_id,
                }),
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
                "/statistics/operations/search",
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
