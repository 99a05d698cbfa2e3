//! Shared fixtures: synthetic survey files and in-process mock servers.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Survey data
// ---------------------------------------------------------------------------

pub const SURVEY_HEADER: &str = "GENDER,AGE,SMOKING,YELLOW_FINGERS,ANXIETY,PEER_PRESSURE,\
CHRONIC DISEASE,FATIGUE,ALLERGY,WHEEZING,ALCOHOL CONSUMING,COUGHING,\
SHORTNESS OF BREATH,SWALLOWING DIFFICULTY,CHEST PAIN,LUNG_CANCER";

/// Number of 1/2-coded symptom columns between AGE and LUNG_CANCER
pub const N_SYMPTOMS: usize = 13;

fn splitmix(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One survey row; symptoms are 1 (no) or 2 (yes).
pub fn survey_row(i: usize, lung_cancer: bool) -> String {
    let symptoms: Vec<String> = (0..N_SYMPTOMS)
        .map(|j| (1 + (splitmix((i * 16 + j) as u64) & 1)).to_string())
        .collect();
    format!(
        "{},{},{},{}",
        if i % 2 == 0 { "M" } else { "F" },
        40 + i,
        symptoms.join(","),
        if lung_cancer { "YES" } else { "NO" }
    )
}

/// Label derived from the symptoms with some noise, about 3:1 positive.
pub fn survey_label(i: usize) -> bool {
    let symptom = |j: usize| 1 + (splitmix((i * 16 + j) as u64) & 1);
    // YELLOW_FINGERS, ANXIETY, FATIGUE, COUGHING
    let score = symptom(1) + symptom(2) + symptom(5) + symptom(9);
    score >= 6 || splitmix((i * 16 + 15) as u64) % 4 == 0
}

pub fn write_lines(path: &FsPath, lines: &[String]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "{}", SURVEY_HEADER).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
}

/// `n_rows` generated survey rows
pub fn write_survey(dir: &FsPath, n_rows: usize) -> PathBuf {
    let path = dir.join("survey.csv");
    let lines: Vec<String> = (0..n_rows).map(|i| survey_row(i, survey_label(i))).collect();
    write_lines(&path, &lines);
    path
}

/// Ten rows, two of them negative
pub fn write_ten_row_survey(dir: &FsPath) -> PathBuf {
    let path = dir.join("ten_rows.csv");
    let lines: Vec<String> = (0..10).map(|i| survey_row(i, i != 3 && i != 7)).collect();
    write_lines(&path, &lines);
    path
}

// ---------------------------------------------------------------------------
// Mock servers
// ---------------------------------------------------------------------------

/// Everything the mock servers received
#[derive(Debug, Default)]
pub struct Recorded {
    /// (endpoint, JSON body) for every tracker call
    pub calls: Vec<(String, Value)>,
    /// (path, bytes) for every artifact upload
    pub artifacts: Vec<(String, Vec<u8>)>,
    /// (index, document) for every indexed document
    pub documents: Vec<(String, Value)>,
    pub experiment_created: bool,
    pub runs: usize,
}

impl Recorded {
    pub fn bodies(&self, endpoint: &str) -> Vec<Value> {
        self.calls
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MockState {
    pub recorded: Arc<Mutex<Recorded>>,
    /// Reject `runs/log-metric` with a server error
    pub fail_metrics: bool,
}

impl MockState {
    fn record(&self, endpoint: &str, body: Value) {
        self.recorded.lock().unwrap().calls.push((endpoint.to_string(), body));
    }
}

async fn get_experiment(State(state): State<MockState>) -> (StatusCode, Json<Value>) {
    let recorded = state.recorded.lock().unwrap();
    if recorded.experiment_created {
        (
            StatusCode::OK,
            Json(json!({ "experiment": { "experiment_id": "1", "name": "test" } })),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error_code": "RESOURCE_DOES_NOT_EXIST" })),
        )
    }
}

async fn create_experiment(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("experiments/create", body);
    state.recorded.lock().unwrap().experiment_created = true;
    Json(json!({ "experiment_id": "1" }))
}

async fn create_run(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("runs/create", body);
    let run_id = {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.runs += 1;
        format!("run-{}", recorded.runs)
    };
    Json(json!({
        "run": {
            "info": {
                "run_id": run_id,
                "experiment_id": "1",
                "status": "RUNNING",
                "artifact_uri": format!("mlflow-artifacts:/1/{}/artifacts", run_id),
            },
            "data": {}
        }
    }))
}

async fn log_batch(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("runs/log-batch", body);
    Json(json!({}))
}

async fn log_metric(State(state): State<MockState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if state.fail_metrics {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error_code": "INTERNAL_ERROR" })),
        );
    }
    state.record("runs/log-metric", body);
    (StatusCode::OK, Json(json!({})))
}

async fn set_tag(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("runs/set-tag", body);
    Json(json!({}))
}

async fn update_run(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("runs/update", body);
    Json(json!({}))
}

async fn upload_artifact(State(state): State<MockState>, Path(path): Path<String>, body: Bytes) -> Json<Value> {
    state.recorded.lock().unwrap().artifacts.push((path, body.to_vec()));
    Json(json!({}))
}

pub fn mlflow_router(state: MockState) -> Router {
    Router::new()
        .route("/api/2.0/mlflow/experiments/get-by-name", get(get_experiment))
        .route("/api/2.0/mlflow/experiments/create", post(create_experiment))
        .route("/api/2.0/mlflow/runs/create", post(create_run))
        .route("/api/2.0/mlflow/runs/log-batch", post(log_batch))
        .route("/api/2.0/mlflow/runs/log-metric", post(log_metric))
        .route("/api/2.0/mlflow/runs/set-tag", post(set_tag))
        .route("/api/2.0/mlflow/runs/update", post(update_run))
        .route("/api/2.0/mlflow-artifacts/artifacts/*path", put(upload_artifact))
        .with_state(state)
}

async fn index_root() -> Json<Value> {
    Json(json!({ "cluster_name": "mock", "version": { "number": "8.0.0" } }))
}

async fn index_document(
    State(state): State<MockState>,
    Path(index): Path<String>,
    Json(doc): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut recorded = state.recorded.lock().unwrap();
    recorded.documents.push((index.clone(), doc));
    let id = format!("doc-{}", recorded.documents.len());
    (
        StatusCode::CREATED,
        Json(json!({ "_index": index, "_id": id, "result": "created" })),
    )
}

pub fn index_router(state: MockState) -> Router {
    Router::new()
        .route("/", get(index_root))
        .route("/:index/_doc", post(index_document))
        .with_state(state)
}

async fn reject_document(State(state): State<MockState>, Path(index): Path<String>) -> (StatusCode, Json<Value>) {
    state.record(&format!("{}/_doc", index), Value::Null);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": { "type": "cluster_block_exception" }, "status": 500 })),
    )
}

/// Index that answers pings but rejects every document
pub fn failing_index_router(state: MockState) -> Router {
    Router::new()
        .route("/", get(index_root))
        .route("/:index/_doc", post(reject_document))
        .with_state(state)
}

/// Start an axum app as a real TCP listener and return its base URL.
pub async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{addr}");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (url, handle)
}

/// Base URL nothing listens on
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
