use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Generated run reports.
pub struct ReportsOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> ReportsOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn delete(&self, runid: i64) -> Result<Value> {
        self.api
            .post("/reports/operations/delete", json!({"runid": runid}))
            .await
    }

    pub async fn get_report_contents(
        &self,
        runid: i64,
        get_table_of_contents: bool,
    ) -> Result<Value> {
        self.api
            .post(
                "/reports/operations/getReportContents",
                json!({"runid": runid, "getTableOfContents": get_table_of_contents}),
            )
            .await
    }

    /// One report table, addressed by its section id (e.g. `"3.4"`).
    pub async fn get_report_table(&self, runid: i64, section_id: &str) -> Result<Value> {
        self.api
            .post(
                "/reports/operations/getReportTable",
                json!({"runid": runid, "sectionId": section_id}),
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
                "/reports/operations/search",
                json!({
                    "searchString": search_string,
                    "limit": limit,
                    "sort": sort,
                    "sortorder": sortorder,
                }),
            )
            .await
    }

    pub async fn export_report(
        &self,
        file: &Path,
        runid: i64,
        report_type: &str,
        section_ids: &str,
        data_type: &str,
    ) -> Result<()> {
        self.api
            .export(
                "/reports/operations/exportReport",
                file,
                json!({
                    "runid": runid,
                    "reportType": report_type,
                    "sectionIds": section_ids,
                    "dataType": data_type,
                }),
            )
            .await
    }
}
