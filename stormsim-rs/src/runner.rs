//! End-to-end model run orchestration.
//!
//! [`run_model`] drives one complete run against an already-authenticated
//! session: prepare the model and network, reconcile component activation,
//! reserve ports, launch, poll to completion, collect results, then release
//! every port and log out. Preparation and reservation failures abort
//! immediately; polling and collection failures abort the run but never skip
//! cleanup; cleanup failures are logged and reported, never raised.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::ops::{NetworkOps, ReportsOps, TestModelOps, TopologyOps};
use crate::session::ApiClient;
use crate::value;

/// Everything one run needs, supplied by the embedding binary.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    pub network: String,
    /// Component labels that should be active; everything else is
    /// deactivated. Matched case-insensitively, whitespace-trimmed.
    pub active_components: Vec<String>,
    pub slot: u32,
    pub ports: Vec<u32>,
    /// Concurrency group the run is launched in.
    pub group: u32,
    pub allow_malware: bool,
    pub poll_interval: Duration,
    /// Report section fetched after the run.
    pub report_section: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            network: String::new(),
            active_components: Vec::new(),
            slot: 1,
            ports: Vec::new(),
            group: 2,
            allow_malware: false,
            poll_interval: Duration::from_secs(5),
            report_section: "3.4".to_string(),
        }
    }
}

/// Last polled state of a running test.
#[derive(Debug, Clone)]
pub struct RunStatus {
    pub phase: String,
    pub state: String,
    pub progress: i64,
    pub init_progress: i64,
    pub completed: bool,
}

impl RunStatus {
    fn from_value(status: &Value) -> Result<Self> {
        value::require_object(status, "running test status")?;
        Ok(Self {
            phase: value::str_or_empty(status, "phase"),
            state: value::str_or_empty(status, "state"),
            progress: value::i64_or_zero(status, "progress"),
            init_progress: value::i64_or_zero(status, "initProgress"),
            completed: value::bool_or_false(status, "completed"),
        })
    }
}

/// How polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The appliance reported completion: flag set or progress at 100.
    Completed,
    /// The status resource vanished mid-run. Completed, cancelled, or
    /// externally failed; the appliance no longer says which, so neither
    /// do we.
    Unknown,
}

/// A port that could not be unreserved during cleanup.
#[derive(Debug, Clone)]
pub struct ReleaseFailure {
    pub slot: u32,
    pub port: u32,
    pub error: String,
}

/// Outcome of one orchestrated run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub outcome: RunOutcome,
    pub last_status: Option<RunStatus>,
    /// Progress reported by the post-run summary statistics.
    pub final_progress: Option<i64>,
    pub report_table: Value,
    pub release_failures: Vec<ReleaseFailure>,
}

/// Runs `cfg.model` end to end. Logout is attempted on every exit path,
/// success or failure.
pub async fn run_model(api: &dyn ApiClient, cfg: &RunConfig) -> Result<RunReport> {
    let result = run_inner(api, cfg).await;
    info!("logging out");
    if let Err(err) = api.logout().await {
        warn!(%err, "logout failed");
    }
    result
}

async fn run_inner(api: &dyn ApiClient, cfg: &RunConfig) -> Result<RunReport> {
    prepare_model(api, cfg).await?;
    reconcile_components(api, cfg).await?;
    prepare_network(api, cfg).await?;
    reserve_ports(api, cfg).await?;
    // From here on the ports are held: whatever the run does, release every
    // one of them before propagating the outcome.
    let result = drive_run(api, cfg).await;
    let release_failures = release_ports(api, cfg).await;
    let mut report = result?;
    report.release_failures = release_failures;
    Ok(report)
}

async fn prepare_model(api: &dyn ApiClient, cfg: &RunConfig) -> Result<()> {
    let models = TestModelOps::new(api);
    info!(model = %cfg.model, "searching for test model");
    let found = models.search(&cfg.model, 5, "name", "ascending").await?;
    if search_is_empty(&found) {
        return Err(Error::NotFound(format!("test model {:?}", cfg.model)));
    }
    info!(model = %cfg.model, "loading test model");
    models.load(&cfg.model, true).await?;
    Ok(())
}

/// Lists the working model's components and PATCHes only those whose active
/// flag differs from the allow-list, saving the model only if something
/// actually changed.
async fn reconcile_components(api: &dyn ApiClient, cfg: &RunConfig) -> Result<()> {
    let models = TestModelOps::new(api);
    info!("adjusting test model component state");
    let raw = models.list_components().await?;
    let components = value::require_array(&raw, "component list")?;

    let wanted: HashSet<String> = cfg
        .active_components
        .iter()
        .map(|label| label.trim().to_ascii_lowercase())
        .collect();

    let mut changed = false;
    for component in components {
        if !component.is_object() {
            continue;
        }
        let label = value::str_or_empty(component, "label");
        let id = value::require_str(component, "id")?;
        let active = value::bool_or_false(component, "active");
        let want_active = wanted.contains(&label.trim().to_ascii_lowercase());
        if active != want_active {
            info!(label = %label, active = want_active, "component state change");
            models.set_component_active(id, want_active).await?;
            changed = true;
        }
    }

    if changed {
        info!("saving component changes");
        models.save(&cfg.model, true).await?;
    }
    Ok(())
}

async fn prepare_network(api: &dyn ApiClient, cfg: &RunConfig) -> Result<()> {
    let networks = NetworkOps::new(api);
    info!(network = %cfg.network, "searching for network config");
    let found = networks
        .search(&cfg.network, "", "", "ascending", "name", 10, 0)
        .await?;
    if search_is_empty(&found) {
        return Err(Error::NotFound(format!("network config {:?}", cfg.network)));
    }
    info!(network = %cfg.network, "loading network config");
    networks.load(&cfg.network).await?;
    Ok(())
}

/// One reserve call per port. On any failure the ports reserved so far are
/// released before the error propagates; the run is never attempted.
async fn reserve_ports(api: &dyn ApiClient, cfg: &RunConfig) -> Result<()> {
    let topology = TopologyOps::new(api);
    info!(slot = cfg.slot, ports = ?cfg.ports, "reserving ports");
    let mut reserved: Vec<u32> = Vec::new();
    for &port in &cfg.ports {
        let request = json!([{"slot": cfg.slot, "port": port, "group": cfg.group}]);
        if let Err(err) = topology.reserve(request, true).await {
            warn!(port, %err, "port reservation failed, releasing partial reservation");
            release(api, cfg, &reserved).await;
            return Err(err);
        }
        reserved.push(port);
    }
    Ok(())
}

async fn release_ports(api: &dyn ApiClient, cfg: &RunConfig) -> Vec<ReleaseFailure> {
    info!("unreserving ports");
    release(api, cfg, &cfg.ports).await
}

/// Best-effort release: every port is attempted regardless of earlier
/// failures, and each failure is logged and collected.
async fn release(api: &dyn ApiClient, cfg: &RunConfig, ports: &[u32]) -> Vec<ReleaseFailure> {
    let topology = TopologyOps::new(api);
    let mut failures = Vec::new();
    for &port in ports {
        let request = json!([{"slot": cfg.slot, "port": port}]);
        if let Err(err) = topology.unreserve(request).await {
            warn!(port, %err, "failed to unreserve port");
            failures.push(ReleaseFailure {
                slot: cfg.slot,
                port,
                error: err.to_string(),
            });
        }
    }
    failures
}

async fn drive_run(api: &dyn ApiClient, cfg: &RunConfig) -> Result<RunReport> {
    let models = TestModelOps::new(api);
    let launch = models.run(&cfg.model, cfg.group, cfg.allow_malware).await?;
    let run_id = launch
        .get("runid")
        .and_then(value::as_i64_lenient)
        .ok_or_else(|| {
            Error::UnexpectedResponse(format!("no runid in run response: {launch}"))
        })?;
    info!(run_id, "test running");

    let (outcome, last_status) = poll_run(api, run_id, cfg.poll_interval).await?;
    collect_results(api, cfg, run_id, outcome, last_status).await
}

/// Blocks until the run reaches a terminal condition, sleeping
/// `interval` between polls. Terminal conditions, in precedence order: the
/// status resource is gone, the completion flag is set, progress is at 100.
/// Transport errors are fatal, not retried.
async fn poll_run(
    api: &dyn ApiClient,
    run_id: i64,
    interval: Duration,
) -> Result<(RunOutcome, Option<RunStatus>)> {
    let path = format!("/topology/runningTest/TEST-{run_id}");
    let mut last = None;
    loop {
        let resp = api.get(&path, None, &[]).await?;
        if resp.is_null() {
            info!(run_id, "run status resource is gone, run finished externally");
            return Ok((RunOutcome::Unknown, last));
        }
        let status = RunStatus::from_value(&resp)?;
        info!(
            phase = %status.phase,
            state = %status.state,
            progress = status.progress,
            init_progress = status.init_progress,
            completed = status.completed,
            "run progress"
        );
        let done = status.completed || status.progress >= 100;
        last = Some(status);
        if done {
            info!(run_id, "test completed");
            return Ok((RunOutcome::Completed, last));
        }
        tokio::time::sleep(interval).await;
    }
}

async fn collect_results(
    api: &dyn ApiClient,
    cfg: &RunConfig,
    run_id: i64,
    outcome: RunOutcome,
    last_status: Option<RunStatus>,
) -> Result<RunReport> {
    let models = TestModelOps::new(api);
    let stats = models
        .real_time_stats(run_id, "summary", -1, 1, "", &[])
        .await?;
    let final_progress = stats.get("progress").and_then(value::as_i64_lenient);
    info!(final_progress, "final progress");

    let report_table = ReportsOps::new(api)
        .get_report_table(run_id, &cfg.report_section)
        .await?;

    Ok(RunReport {
        run_id,
        outcome,
        last_status,
        final_progress,
        report_table,
        release_failures: Vec::new(),
    })
}

/// The appliance signals "nothing matched" as a null body; an empty result
/// array means the same thing.
fn search_is_empty(found: &Value) -> bool {
    match found {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeApi;

    const STATUS_PATH: &str = "/topology/runningTest/TEST-42";

    fn config() -> RunConfig {
        RunConfig {
            model: "maxload".to_string(),
            network: "core-lan".to_string(),
            active_components: vec!["HTTP Throughput".to_string()],
            ports: vec![0, 1, 4, 5],
            poll_interval: Duration::ZERO,
            ..RunConfig::default()
        }
    }

    fn progress(value: i64) -> Value {
        json!({"phase": "steady", "state": "running", "progress": value, "completed": false})
    }

    /// Scripts search/load/components/network so a run reaches reservation.
    /// Component state already matches the allow-list.
    fn script_preparation(api: &FakeApi) {
        api.script_post("/testmodel/operations/search", [json!([{"name": "maxload"}])]);
        api.script_get(
            "/testmodel/component",
            [json!([
                {"id": "c1", "label": "HTTP Throughput", "active": true},
                {"id": "c2", "label": "Malware Storm", "active": false},
            ])],
        );
        api.script_post("/network/operations/search", [json!([{"name": "core-lan"}])]);
    }

    fn script_launch_and_collection(api: &FakeApi) {
        api.script_post("/testmodel/operations/run", [json!({"runid": 42})]);
        api.script_post("/testmodel/operations/realTimeStats", [json!({"progress": 100})]);
        api.script_post(
            "/reports/operations/getReportTable",
            [json!({"rows": [["frames sent", "123456"]]})],
        );
    }

    #[tokio::test]
    async fn polling_stops_after_observing_full_progress() {
        let api = FakeApi::new();
        script_preparation(&api);
        script_launch_and_collection(&api);
        api.script_get(STATUS_PATH, [progress(10), progress(55), progress(100)]);

        let report = run_model(&api, &config()).await.expect("run");

        assert_eq!(api.calls_to("GET", STATUS_PATH), 3);
        assert_eq!(report.run_id, 42);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.final_progress, Some(100));
        assert!(report.release_failures.is_empty());
        // Component state already matched: no patches, no save.
        assert_eq!(api.calls_to("POST", "/testmodel/operations/save"), 0);
        // All four ports reserved and released, one call each.
        assert_eq!(api.calls_to("POST", "/topology/operations/reserve"), 4);
        assert_eq!(api.calls_to("POST", "/topology/operations/unreserve"), 4);
        assert_eq!(api.logouts(), 1);
    }

    #[tokio::test]
    async fn completion_flag_ends_polling_before_full_progress() {
        let api = FakeApi::new();
        script_preparation(&api);
        script_launch_and_collection(&api);
        api.script_get(
            STATUS_PATH,
            [progress(30), json!({"progress": 64, "completed": true})],
        );

        let report = run_model(&api, &config()).await.expect("run");
        assert_eq!(api.calls_to("GET", STATUS_PATH), 2);
        assert_eq!(report.outcome, RunOutcome::Completed);
        let last = report.last_status.expect("last status");
        assert!(last.completed);
        assert_eq!(last.progress, 64);
    }

    #[tokio::test]
    async fn vanished_status_resource_ends_polling_as_unknown() {
        let api = FakeApi::new();
        script_preparation(&api);
        script_launch_and_collection(&api);
        // One real poll, then the queue is exhausted and the fake answers
        // Null: the resource is gone.
        api.script_get(STATUS_PATH, [progress(10)]);

        let report = run_model(&api, &config()).await.expect("run");
        assert_eq!(api.calls_to("GET", STATUS_PATH), 2);
        assert_eq!(report.outcome, RunOutcome::Unknown);
        assert_eq!(report.last_status.expect("last status").progress, 10);
        assert_eq!(api.logouts(), 1);
    }

    #[tokio::test]
    async fn failed_unreserve_is_reported_and_does_not_stop_the_others() {
        let api = FakeApi::new();
        script_preparation(&api);
        script_launch_and_collection(&api);
        api.script_get(STATUS_PATH, [progress(100)]);
        api.fail_post("/topology/operations/unreserve", "\"port\":4");

        let report = run_model(&api, &config()).await.expect("run");

        // Every port was attempted, port 4's failure is reported, not raised.
        assert_eq!(api.calls_to("POST", "/topology/operations/unreserve"), 4);
        assert_eq!(report.release_failures.len(), 1);
        assert_eq!(report.release_failures[0].port, 4);
        assert_eq!(api.logouts(), 1);
    }

    #[tokio::test]
    async fn reservation_failure_releases_partial_reservation_and_aborts() {
        let api = FakeApi::new();
        script_preparation(&api);
        api.fail_post("/topology/operations/reserve", "\"port\":4");

        let err = run_model(&api, &config()).await.expect_err("must abort");
        assert!(matches!(err, Error::Transport { .. }));

        // Ports 0 and 1 were reserved and are released; the run never starts.
        assert_eq!(api.calls_to("POST", "/topology/operations/reserve"), 3);
        assert_eq!(api.calls_to("POST", "/topology/operations/unreserve"), 2);
        assert_eq!(api.calls_to("POST", "/testmodel/operations/run"), 0);
        assert_eq!(api.logouts(), 1);
    }

    #[tokio::test]
    async fn collection_failure_still_releases_ports_and_logs_out() {
        let api = FakeApi::new();
        script_preparation(&api);
        api.script_post("/testmodel/operations/run", [json!({"runid": 42})]);
        api.script_get(STATUS_PATH, [progress(100)]);
        api.fail_post("/testmodel/operations/realTimeStats", "");

        let err = run_model(&api, &config()).await.expect_err("must abort");
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(api.calls_to("POST", "/topology/operations/unreserve"), 4);
        assert_eq!(api.logouts(), 1);
    }

    #[tokio::test]
    async fn missing_model_fails_fast_but_still_logs_out() {
        let api = FakeApi::new();
        // Nothing scripted: the search answers Null.

        let err = run_model(&api, &config()).await.expect_err("must abort");
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(api.calls_to("POST", "/testmodel/operations/load"), 0);
        assert_eq!(api.calls_to("POST", "/topology/operations/reserve"), 0);
        assert_eq!(api.logouts(), 1);
    }

    #[tokio::test]
    async fn reconciliation_patches_only_drifted_components() {
        let api = FakeApi::new();
        api.script_get(
            "/testmodel/component",
            [json!([
                // Wanted active, currently inactive: patched on.
                {"id": "c1", "label": "http throughput", "active": false},
                // Not wanted, currently active: patched off.
                {"id": "c2", "label": "DDoS Flood", "active": true},
                // Already matching: untouched.
                {"id": "c3", "label": "Background Noise", "active": false},
            ])],
        );

        reconcile_components(&api, &config()).await.expect("reconcile");

        assert_eq!(
            api.bodies_for("PATCH", "/testmodel/component/c1"),
            vec![json!({"active": true})]
        );
        assert_eq!(
            api.bodies_for("PATCH", "/testmodel/component/c2"),
            vec![json!({"active": false})]
        );
        assert_eq!(api.calls_to("PATCH", "/testmodel/component/c3"), 0);
        assert_eq!(api.calls_to("POST", "/testmodel/operations/save"), 1);
    }

    #[tokio::test]
    async fn reconciliation_is_a_no_op_when_state_already_matches() {
        let api = FakeApi::new();
        api.script_get(
            "/testmodel/component",
            [json!([
                {"id": "c1", "label": "HTTP Throughput", "active": true},
                {"id": "c2", "label": "DDoS Flood", "active": false},
            ])],
        );

        reconcile_components(&api, &config()).await.expect("reconcile");

        assert_eq!(api.calls_to("PATCH", "/testmodel/component/c1"), 0);
        assert_eq!(api.calls_to("PATCH", "/testmodel/component/c2"), 0);
        assert_eq!(api.calls_to("POST", "/testmodel/operations/save"), 0);
    }

    #[tokio::test]
    async fn component_without_string_id_is_a_shape_error() {
        let api = FakeApi::new();
        api.script_get(
            "/testmodel/component",
            [json!([{"id": 7, "label": "HTTP Throughput", "active": false}])],
        );

        let err = reconcile_components(&api, &config())
            .await
            .expect_err("must fail");
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }
}
