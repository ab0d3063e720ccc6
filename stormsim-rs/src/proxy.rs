//! Generic addressable view over the appliance's configuration tree.
//!
//! A proxy node is nothing but a path under construction: `field` and `item`
//! compose segments without touching the network, and only the leaf verbs
//! (`get`, `set`, `put`, `delete`, `cached_get`) resolve the accumulated path
//! against the session. This mirrors the appliance's own tree addressing, so
//! no per-node type is needed.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::session::ApiClient;

/// One node of the remote data-model tree.
pub struct DataModelProxy<'a> {
    api: &'a dyn ApiClient,
    name: String,
    parent_path: String,
    model_path: String,
    cache: HashMap<String, Value>,
}

impl<'a> DataModelProxy<'a> {
    /// A root node, e.g. `topology` or `network`.
    pub fn root(api: &'a dyn ApiClient, name: &str) -> Self {
        Self {
            api,
            name: name.to_string(),
            parent_path: String::new(),
            model_path: format!("/{name}"),
            cache: HashMap::new(),
        }
    }

    /// The literal REST path of this node: its ancestors' segments in
    /// creation order, root-anchored.
    pub fn full_path(&self) -> String {
        if self.parent_path.is_empty() {
            format!("/{}", self.name)
        } else {
            format!("{}/{}", self.parent_path, self.name)
        }
    }

    /// The semantic data-model path: like [`Self::full_path`], but array
    /// indices introduced by [`Self::item`] are not part of it, so a node
    /// addressed through an index still resolves against the logical model.
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Child node for a named field. Pure path composition, no I/O.
    pub fn field(&self, name: &str) -> DataModelProxy<'a> {
        DataModelProxy {
            api: self.api,
            name: name.to_string(),
            parent_path: self.full_path(),
            model_path: format!("{}/{}", self.model_path, name),
            cache: HashMap::new(),
        }
    }

    /// Child node for an array element. Pure path composition, no I/O.
    pub fn item(&self, index: impl fmt::Display) -> DataModelProxy<'a> {
        DataModelProxy {
            api: self.api,
            name: index.to_string(),
            parent_path: self.full_path(),
            model_path: self.model_path.clone(),
            cache: HashMap::new(),
        }
    }

    /// Reads this node. `depth` limits how far the server expands nested
    /// structure.
    pub async fn get(&self, depth: Option<i32>, params: &[(String, String)]) -> Result<Value> {
        self.api.get(&self.full_path(), depth, params).await
    }

    /// Partial update (PATCH) of this node.
    pub async fn set(&self, value: Value) -> Result<()> {
        self.api.patch(&self.full_path(), value).await
    }

    /// Full replacement (PUT) of this node.
    pub async fn put(&self, value: Value) -> Result<()> {
        self.api.put(&self.full_path(), value).await
    }

    pub async fn delete(&self) -> Result<Value> {
        self.api.delete(&self.full_path()).await
    }

    /// Reads `field` under the semantic model path, fetching at most once
    /// per field per node instance.
    ///
    /// The cache is never invalidated: later calls return the first observed
    /// value even if the remote value has changed since. Callers that need a
    /// fresh read go through [`Self::field`] + [`Self::get`] instead.
    pub async fn cached_get(&mut self, field: &str) -> Result<Value> {
        if let Some(value) = self.cache.get(field) {
            return Ok(value.clone());
        }
        let path = format!("{}/{field}", self.model_path);
        let value = self.api.get(&path, None, &[]).await?;
        self.cache.insert(field.to_string(), value.clone());
        Ok(value)
    }
}

impl fmt::Debug for DataModelProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataModelProxy")
            .field("name", &self.name)
            .field("path", &self.full_path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeApi;
    use serde_json::json;

    #[test]
    fn paths_concatenate_segments_in_call_order() {
        let api = FakeApi::new();
        let root = DataModelProxy::root(&api, "topology");
        assert_eq!(root.full_path(), "/topology");

        let node = root.field("slot").item(2).field("port").item(7);
        assert_eq!(node.full_path(), "/topology/slot/2/port/7");

        let deep = root.field("a").field("b").field("c");
        assert_eq!(deep.full_path(), "/topology/a/b/c");
    }

    #[test]
    fn item_indices_stay_out_of_the_model_path() {
        let api = FakeApi::new();
        let root = DataModelProxy::root(&api, "network");
        let node = root.field("interface").item(0).field("mac");
        assert_eq!(node.full_path(), "/network/interface/0/mac");
        assert_eq!(node.model_path(), "/network/interface/mac");
    }

    #[tokio::test]
    async fn cached_get_fetches_once_and_keeps_the_first_value() {
        let api = FakeApi::new();
        api.script_get("/testmodel/revision", [json!(3), json!(9)]);

        let mut node = DataModelProxy::root(&api, "testmodel");
        assert_eq!(node.cached_get("revision").await.expect("first"), json!(3));
        // The remote value has "changed" to 9, but the cache wins.
        assert_eq!(node.cached_get("revision").await.expect("second"), json!(3));
        assert_eq!(node.cached_get("revision").await.expect("third"), json!(3));
        assert_eq!(api.calls_to("GET", "/testmodel/revision"), 1);
    }

    #[tokio::test]
    async fn leaf_verbs_resolve_the_composed_path() {
        let api = FakeApi::new();
        api.script_get("/topology/slot/1", [json!({"state": "ok"})]);

        let root = DataModelProxy::root(&api, "topology");
        let slot = root.field("slot").item(1);
        assert_eq!(
            slot.get(Some(2), &[]).await.expect("get"),
            json!({"state": "ok"})
        );
        slot.set(json!({"reserved": true})).await.expect("set");
        assert_eq!(api.calls_to("PATCH", "/topology/slot/1"), 1);
    }
}
