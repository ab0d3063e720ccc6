use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// Appliance administration: licensing, config purge, bulk test transfer.
pub struct AdministrationOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> AdministrationOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn import_ati_license(&self, file: &Path, name: &str) -> Result<Value> {
        self.api
            .import(
                "/administration/atiLicensing/operations/importAtiLicense",
                file,
                json!({"filename": file.to_string_lossy(), "name": name}),
            )
            .await
    }

    pub async fn config_purge(&self, config_purge: Value) -> Result<Value> {
        self.api
            .post(
                "/administration/operations/configPurge",
                json!({"configPurge": config_purge}),
            )
            .await
    }

    pub async fn export_all_tests(&self, file: &Path) -> Result<()> {
        self.api
            .export("/administration/operations/exportAllTests", file, json!({}))
            .await
    }

    pub async fn import_all_tests(&self, name: &str, file: &Path, force: bool) -> Result<Value> {
        self.api
            .import(
                "/administration/operations/importAllTests",
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
