//! Session/transport layer for the Storm appliance REST API.
//!
//! One [`Session`] owns one authenticated channel: the two-step handshake
//! exchanges credentials for a `sessionId`/`X-API-KEY` header pair, and every
//! later call carries both. The generic verbs classify status codes uniformly
//! (200/202/204 success, 400 client error, anything else transport failure)
//! and hand back dynamic [`Value`]s because the appliance's payload shapes
//! vary per endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ops::{
    AdministrationOps, AppProfileOps, CaptureOps, EvasionProfileOps, LoadProfileOps, NetworkOps,
    RemoteOps, ReportsOps, ResultsOps, StatisticsOps, StrikeListOps, StrikesOps, SuperflowOps,
    TestModelOps, TopologyOps,
};
use crate::proxy::DataModelProxy;

/// API revision this client speaks, compared against the server's
/// `apiServer` version at login.
pub const CLIENT_VERSION: &str = "11.0";

const API_BASE: &str = "storm/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The verb surface the rest of the crate depends on.
///
/// Proxies, operation wrappers, and the orchestrator all borrow the session
/// through this trait, which is what lets the orchestration logic run against
/// a scripted fake in tests. `logout` is included so cleanup paths reach the
/// session through the same seam.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str, depth: Option<i32>, params: &[(String, String)])
        -> Result<Value>;
    async fn post(&self, path: &str, body: Value) -> Result<Value>;
    async fn put(&self, path: &str, body: Value) -> Result<()>;
    async fn patch(&self, path: &str, body: Value) -> Result<()>;
    async fn delete(&self, path: &str) -> Result<Value>;
    /// POST-triggered artifact generation; the server answers with a
    /// server-relative path which is fetched and persisted to `file`.
    async fn export(&self, path: &str, file: &Path, params: Value) -> Result<()>;
    /// Multipart upload: the file contents plus a `fileInfo` metadata field.
    async fn import(&self, path: &str, file: &Path, params: Value) -> Result<Value>;
    async fn logout(&self) -> Result<()>;
}

#[derive(Deserialize)]
struct SessionTokens {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "apiKey")]
    api_key: String,
}

/// Aggregated timings for one (verb, path) pair, in seconds.
#[derive(Debug, Clone)]
pub struct ProfilingEntry {
    pub verb: String,
    pub path: String,
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

type ProfilingStore = HashMap<String, HashMap<String, Vec<f64>>>;

/// An authenticated channel to one appliance.
pub struct Session {
    host: String,
    user: String,
    password: String,
    http: reqwest::Client,
    check_version: bool,
    auth: RwLock<Option<SessionTokens>>,
    server_info: RwLock<Option<Value>>,
    profiling_enabled: AtomicBool,
    profiling: RwLock<ProfilingStore>,
}

impl Session {
    /// Builds an unauthenticated session. The appliance serves a self-signed
    /// certificate, so certificate validation is disabled.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        check_version: bool,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            http,
            check_version,
            auth: RwLock::new(None),
            server_info: RwLock::new(None),
            profiling_enabled: AtomicBool::new(false),
            profiling: RwLock::new(HashMap::new()),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server version reported at login, when available.
    pub fn server_version(&self) -> Option<String> {
        self.server_info
            .read()
            .as_ref()
            .and_then(|info| info.get("apiServer"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn core_url(&self, path: &str) -> String {
        format!("https://{}/{API_BASE}/v2/core{path}", self.host)
    }

    fn session_url(&self) -> String {
        format!("https://{}/{API_BASE}/v1/auth/session", self.host)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &*self.auth.read() {
            Some(tokens) => req
                .header("sessionId", &tokens.session_id)
                .header("X-API-KEY", &tokens.api_key),
            None => req,
        }
    }

    fn session_id(&self) -> String {
        self.auth
            .read()
            .as_ref()
            .map(|tokens| tokens.session_id.clone())
            .unwrap_or_default()
    }

    /// Opens the low-level transport session, exchanging credentials for the
    /// `sessionId`/`apiKey` header pair.
    async fn connect(&self) -> Result<()> {
        let body = json!({"username": self.user, "password": self.password});
        let resp = self
            .http
            .post(self.session_url())
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "session creation failed: status {status}, {text}"
            )));
        }
        let tokens: SessionTokens = serde_json::from_str(&text)
            .map_err(|err| Error::Auth(format!("malformed session response: {err}")))?;
        *self.auth.write() = Some(tokens);
        info!(host = %self.host, "connected");
        Ok(())
    }

    /// Connects, then exchanges credentials at the core login endpoint for
    /// the server's version/capability object, which is also returned.
    ///
    /// With version checking enabled, a server ahead of [`CLIENT_VERSION`] is
    /// fatal; a server behind it only logs a warning.
    pub async fn login(&self) -> Result<Value> {
        self.connect().await?;
        let body = json!({
            "username": self.user,
            "password": self.password,
            "sessionId": self.session_id(),
        });
        let resp = self
            .with_auth(self.http.post(self.core_url("/auth/login")))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if status.as_u16() != 200 {
            return Err(Error::Auth(format!(
                "login failed: status {status}, {text}"
            )));
        }
        let info: Value = serde_json::from_str(&text)
            .map_err(|err| Error::Auth(format!("malformed login response: {err}")))?;
        *self.server_info.write() = Some(info.clone());
        if self.check_version {
            if let Err(err) = self.validate_version() {
                if let Err(logout_err) = self.logout().await {
                    warn!(%logout_err, "logout after version mismatch failed");
                }
                return Err(err);
            }
        }
        Ok(info)
    }

    /// Invalidates the session server-side, then clears local credentials.
    /// Safe to call at any point, including after a partial login.
    pub async fn logout(&self) -> Result<()> {
        let body = json!({
            "username": self.user,
            "password": self.password,
            "sessionId": self.session_id(),
        });
        let result = async {
            let resp = self
                .with_auth(self.http.post(self.core_url("/auth/logout")))
                .json(&body)
                .send()
                .await?;
            let status = resp.status();
            if status.as_u16() == 200 {
                Ok(())
            } else {
                let text = resp.text().await.unwrap_or_default();
                Err(Error::Transport {
                    status: status.as_u16(),
                    body: text,
                })
            }
        }
        .await;
        self.disconnect().await;
        result
    }

    /// Tears down the v1 transport session. Local tokens are cleared whether
    /// or not the server-side teardown succeeds.
    async fn disconnect(&self) {
        match self
            .with_auth(self.http.delete(self.session_url()))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => debug!(status = %resp.status(), "session teardown returned non-success"),
            Err(err) => debug!(%err, "session teardown failed"),
        }
        *self.auth.write() = None;
    }

    fn validate_version(&self) -> Result<()> {
        let Some(server) = self.server_version() else {
            return Ok(());
        };
        let client = parse_version(CLIENT_VERSION);
        match parse_version(&server).cmp(&client) {
            std::cmp::Ordering::Greater => Err(Error::Version {
                client: CLIENT_VERSION.to_string(),
                server,
            }),
            std::cmp::Ordering::Less => {
                warn!(
                    client = CLIENT_VERSION,
                    server = %server,
                    "client version is newer than server version"
                );
                Ok(())
            }
            std::cmp::Ordering::Equal => Ok(()),
        }
    }

    pub async fn get(
        &self,
        path: &str,
        depth: Option<i32>,
        params: &[(String, String)],
    ) -> Result<Value> {
        let started = self.profiling_timer();
        let mut req = self.with_auth(self.http.get(self.core_url(path)));
        if let Some(depth) = depth {
            req = req.query(&[("responseDepth", depth.to_string())]);
        }
        if !params.is_empty() {
            req = req.query(params);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        self.record_timing("GET", path, started);
        classify(status, body)
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let started = self.profiling_timer();
        let resp = self
            .with_auth(self.http.post(self.core_url(path)))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        self.record_timing("POST", path, started);
        classify(status, text)
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<()> {
        let started = self.profiling_timer();
        let resp = self
            .with_auth(self.http.put(self.core_url(path)))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        self.record_timing("PUT", path, started);
        classify(status, text).map(|_| ())
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<()> {
        let started = self.profiling_timer();
        let resp = self
            .with_auth(self.http.patch(self.core_url(path)))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        self.record_timing("PATCH", path, started);
        classify(status, text).map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        let started = self.profiling_timer();
        let resp = self
            .with_auth(self.http.delete(self.core_url(path)))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        self.record_timing("DELETE", path, started);
        classify(status, text)
    }

    /// Triggers artifact generation, then downloads the server-relative path
    /// from the response body into `file`.
    pub async fn export(&self, path: &str, file: &Path, mut params: Value) -> Result<()> {
        if let Some(map) = params.as_object_mut() {
            map.insert("filepath".to_string(), json!(file.to_string_lossy()));
        }
        let resp = self
            .with_auth(self.http.post(self.core_url(path)))
            .json(&params)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        match status.as_u16() {
            200 | 202 | 204 => match parse_body(&body) {
                Value::String(server_path) if !server_path.is_empty() => {
                    self.download(&server_path, file).await
                }
                other => Err(Error::UnexpectedResponse(format!(
                    "export returned no artifact path: {other}"
                ))),
            },
            400 => Err(Error::BadRequest(body)),
            code => Err(Error::Transport { status: code, body }),
        }
    }

    async fn download(&self, server_path: &str, dest: &Path) -> Result<()> {
        let url = format!("https://{}{server_path}", self.host);
        let resp = self.with_auth(self.http.get(url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Transport {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    /// Uploads `file` as a multipart form, with the operation parameters in
    /// the `fileInfo` side-channel field.
    pub async fn import(&self, path: &str, file: &Path, params: Value) -> Result<Value> {
        let contents = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = Form::new()
            .part("file", Part::bytes(contents).file_name(file_name))
            .text("fileInfo", params.to_string());
        let resp = self
            .with_auth(self.http.post(self.core_url(path)))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        classify(status, body)
    }

    /// Enables or disables call timing. Enabling resets the sample store;
    /// while disabled, capture is a no-op.
    pub fn enable_profiling(&self, enabled: bool) {
        if enabled {
            self.profiling.write().clear();
        }
        self.profiling_enabled.store(enabled, Ordering::Relaxed);
    }

    fn profiling_timer(&self) -> Option<Instant> {
        self.profiling_enabled
            .load(Ordering::Relaxed)
            .then(Instant::now)
    }

    fn record_timing(&self, verb: &str, path: &str, started: Option<Instant>) {
        let Some(started) = started else { return };
        if !self.profiling_enabled.load(Ordering::Relaxed) {
            return;
        }
        self.profiling
            .write()
            .entry(verb.to_string())
            .or_default()
            .entry(path.to_string())
            .or_default()
            .push(started.elapsed().as_secs_f64());
    }

    /// Count/avg/min/max per (verb, path), computed under the read lock.
    pub fn profiling_summary(&self) -> Vec<ProfilingEntry> {
        let store = self.profiling.read();
        let mut entries = Vec::new();
        for (verb, calls) in store.iter() {
            for (path, samples) in calls {
                if samples.is_empty() {
                    continue;
                }
                let sum: f64 = samples.iter().sum();
                let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
                let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                entries.push(ProfilingEntry {
                    verb: verb.clone(),
                    path: path.clone(),
                    count: samples.len(),
                    avg: sum / samples.len() as f64,
                    min,
                    max,
                });
            }
        }
        entries.sort_by(|a, b| (&a.verb, &a.path).cmp(&(&b.verb, &b.path)));
        entries
    }

    /// A proxy for one of the data-model tree roots (`results`, `capture`,
    /// `administration`, `topology`, `loadProfile`, `network`,
    /// `evasionProfile`, `remote`, ...).
    pub fn node(&self, name: &str) -> DataModelProxy<'_> {
        DataModelProxy::root(self, name)
    }

    pub fn test_model(&self) -> TestModelOps<'_> {
        TestModelOps::new(self)
    }

    pub fn network(&self) -> NetworkOps<'_> {
        NetworkOps::new(self)
    }

    pub fn topology(&self) -> TopologyOps<'_> {
        TopologyOps::new(self)
    }

    pub fn reports(&self) -> ReportsOps<'_> {
        ReportsOps::new(self)
    }

    pub fn statistics(&self) -> StatisticsOps<'_> {
        StatisticsOps::new(self)
    }

    pub fn results(&self) -> ResultsOps<'_> {
        ResultsOps::new(self)
    }

    pub fn strike_list(&self) -> StrikeListOps<'_> {
        StrikeListOps::new(self)
    }

    pub fn strikes(&self) -> StrikesOps<'_> {
        StrikesOps::new(self)
    }

    pub fn superflow(&self) -> SuperflowOps<'_> {
        SuperflowOps::new(self)
    }

    pub fn app_profile(&self) -> AppProfileOps<'_> {
        AppProfileOps::new(self)
    }

    pub fn evasion_profile(&self) -> EvasionProfileOps<'_> {
        EvasionProfileOps::new(self)
    }

    pub fn load_profile(&self) -> LoadProfileOps<'_> {
        LoadProfileOps::new(self)
    }

    pub fn capture(&self) -> CaptureOps<'_> {
        CaptureOps::new(self)
    }

    pub fn administration(&self) -> AdministrationOps<'_> {
        AdministrationOps::new(self)
    }

    pub fn remote(&self) -> RemoteOps<'_> {
        RemoteOps::new(self)
    }
}

#[async_trait]
impl ApiClient for Session {
    async fn get(
        &self,
        path: &str,
        depth: Option<i32>,
        params: &[(String, String)],
    ) -> Result<Value> {
        Session::get(self, path, depth, params).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        Session::post(self, path, body).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<()> {
        Session::put(self, path, body).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<()> {
        Session::patch(self, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        Session::delete(self, path).await
    }

    async fn export(&self, path: &str, file: &Path, params: Value) -> Result<()> {
        Session::export(self, path, file, params).await
    }

    async fn import(&self, path: &str, file: &Path, params: Value) -> Result<Value> {
        Session::import(self, path, file, params).await
    }

    async fn logout(&self) -> Result<()> {
        Session::logout(self).await
    }
}

/// Uniform status classification for the generic verbs.
fn classify(status: StatusCode, body: String) -> Result<Value> {
    match status.as_u16() {
        200 | 202 | 204 => Ok(parse_body(&body)),
        400 => Err(Error::BadRequest(body)),
        code => Err(Error::Transport { status: code, body }),
    }
}

/// Empty bodies read as `Null`; bodies that are not JSON come back as raw
/// strings, not errors. Callers tolerate either shape.
fn parse_body(body: &str) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Parses a dotted version into its (major, minor) pair; missing or
/// non-numeric segments read as zero.
fn parse_version(version: &str) -> (u32, u32) {
    let mut parts = version.split('.');
    let major = parts
        .next()
        .and_then(|part| part.trim().parse().ok())
        .unwrap_or(0);
    let minor = parts
        .next()
        .and_then(|part| part.trim().parse().ok())
        .unwrap_or(0);
    (major, minor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_pairs_order_lexicographically() {
        assert_eq!(parse_version("11.0"), (11, 0));
        assert_eq!(parse_version("9"), (9, 0));
        assert_eq!(parse_version("bogus"), (0, 0));
        assert!(parse_version("1.0") < parse_version("1.1"));
        assert!(parse_version("2.0") > parse_version("1.9"));
        assert_eq!(parse_version("1.5"), parse_version("1.5"));
    }

    #[test]
    fn version_check_fatal_only_when_server_is_newer() {
        let session = Session::new("appliance", "admin", "secret", true).expect("session");

        *session.server_info.write() = Some(json!({"apiServer": "99.1"}));
        assert!(matches!(
            session.validate_version(),
            Err(Error::Version { .. })
        ));

        *session.server_info.write() = Some(json!({"apiServer": "1.9"}));
        assert!(session.validate_version().is_ok());

        *session.server_info.write() = Some(json!({"apiServer": CLIENT_VERSION}));
        assert!(session.validate_version().is_ok());

        // No reported version: nothing to compare against.
        *session.server_info.write() = None;
        assert!(session.validate_version().is_ok());
    }

    #[test]
    fn classification_matrix() {
        let ok = classify(StatusCode::OK, "{\"a\": 1}".to_string()).expect("200");
        assert_eq!(ok, json!({"a": 1}));

        let empty = classify(StatusCode::NO_CONTENT, String::new()).expect("204");
        assert!(empty.is_null());

        let accepted = classify(StatusCode::ACCEPTED, String::new()).expect("202");
        assert!(accepted.is_null());

        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, "invalid model".to_string()),
            Err(Error::BadRequest(body)) if body == "invalid model"
        ));

        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
            Err(Error::Transport { status: 500, .. })
        ));
    }

    #[test]
    fn non_json_bodies_come_back_as_raw_text() {
        assert_eq!(
            parse_body("/download/report-17.csv"),
            Value::String("/download/report-17.csv".to_string())
        );
        assert_eq!(parse_body("[1, 2]"), json!([1, 2]));
        assert!(parse_body("").is_null());
    }

    #[test]
    fn profiling_capture_respects_the_enabled_flag() {
        let session = Session::new("appliance", "admin", "secret", false).expect("session");

        session.record_timing("GET", "/testmodel", session.profiling_timer());
        assert!(session.profiling_summary().is_empty());

        session.enable_profiling(true);
        session.record_timing("GET", "/testmodel", session.profiling_timer());
        session.record_timing("GET", "/testmodel", session.profiling_timer());
        let summary = session.profiling_summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].verb, "GET");

        // Re-enabling resets the store.
        session.enable_profiling(true);
        assert!(session.profiling_summary().is_empty());
    }
}
