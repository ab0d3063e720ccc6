use serde_json::{json, Value};

use crate::error::Result;
use crate::session::ApiClient;

/// The appliance's strike catalogue.
pub struct StrikesOps<'a> {
    api: &'a dyn ApiClient,
}

impl<'a> StrikesOps<'a> {
    pub fn new(api: &'a dyn ApiClient) -> Self {
        Self { api }
    }

    pub async fn search(
        &self,
        search_string: &str,
        limit: u32,
        sort: &str,
        sortorder: &str,
        offset: u32,
    ) -> Result<Value> {
        self.api
            .post(
                "/strikes/operations/search",
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
