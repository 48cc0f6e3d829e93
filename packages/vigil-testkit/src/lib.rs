mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	path::PathBuf,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::oneshot};

pub const TEST_TOKEN: &str = "test-session-token";
pub const API_VERSION: &str = "v58.0";

const CURSOR_PREFIX: &str = "01gD";

/// Records served for every query whose text contains `matcher`.
#[derive(Debug, Clone)]
pub struct StubDataset {
	pub matcher: String,
	pub records: Vec<Value>,
	pub page_size: usize,
	/// Overrides the declared `totalSize` to simulate an inconsistent remote.
	pub declared_total: Option<u64>,
}
impl StubDataset {
	pub fn new(matcher: impl Into<String>, records: Vec<Value>, page_size: usize) -> Self {
		Self { matcher: matcher.into(), records, page_size, declared_total: None }
	}
}

struct StubState {
	datasets: Vec<StubDataset>,
	requests: AtomicUsize,
	queries: Mutex<Vec<String>>,
	failures: Mutex<VecDeque<u16>>,
}

/// In-process stand-in for the remote record service, serving paginated query responses.
pub struct StubQueryServer {
	base_url: String,
	state: Arc<StubState>,
	shutdown: Option<oneshot::Sender<()>>,
}
impl StubQueryServer {
	pub async fn start(datasets: Vec<StubDataset>) -> Result<Self> {
		let state = Arc::new(StubState {
			datasets,
			requests: AtomicUsize::new(0),
			queries: Mutex::new(Vec::new()),
			failures: Mutex::new(VecDeque::new()),
		});
		let app = Router::new()
			.route("/services/data/{version}/query", routing::get(first_page))
			.route("/services/data/{version}/query/{locator}", routing::get(next_page))
			.with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { base_url: format!("http://{addr}"), state, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn request_count(&self) -> usize {
		self.state.requests.load(Ordering::SeqCst)
	}

	/// Decoded query texts in arrival order.
	pub fn queries(&self) -> Vec<String> {
		self.state.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Makes the next requests fail with the given statuses, one status per request.
	pub fn fail_next(&self, statuses: &[u16]) {
		let mut failures = self.state.failures.lock().unwrap_or_else(|err| err.into_inner());

		failures.extend(statuses.iter().copied());
	}
}
impl Drop for StubQueryServer {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

#[derive(Deserialize)]
struct QueryParams {
	q: String,
}

async fn first_page(
	State(state): State<Arc<StubState>>,
	Path(version): Path<String>,
	headers: HeaderMap,
	Query(params): Query<QueryParams>,
) -> Response {
	if let Some(response) = gate(&state, &headers) {
		return response;
	}

	state.queries.lock().unwrap_or_else(|err| err.into_inner()).push(params.q.clone());

	let Some(index) = state.datasets.iter().position(|dataset| params.q.contains(&dataset.matcher))
	else {
		return (StatusCode::BAD_REQUEST, format!("No dataset matches query: {}", params.q))
			.into_response();
	};

	Json(render_page(&state, &version, index, 0)).into_response()
}

async fn next_page(
	State(state): State<Arc<StubState>>,
	Path((version, locator)): Path<(String, String)>,
	headers: HeaderMap,
) -> Response {
	if let Some(response) = gate(&state, &headers) {
		return response;
	}

	let parsed = locator.strip_prefix(CURSOR_PREFIX).and_then(|rest| rest.split_once('-')).and_then(
		|(index, offset)| Some((index.parse::<usize>().ok()?, offset.parse::<usize>().ok()?)),
	);
	let Some((index, offset)) = parsed.filter(|(index, _)| *index < state.datasets.len()) else {
		return (StatusCode::NOT_FOUND, format!("Unknown locator: {locator}")).into_response();
	};

	Json(render_page(&state, &version, index, offset)).into_response()
}

fn gate(state: &StubState, headers: &HeaderMap) -> Option<Response> {
	state.requests.fetch_add(1, Ordering::SeqCst);

	let expected = format!("Bearer {TEST_TOKEN}");

	if headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) != Some(expected.as_str())
	{
		return Some(StatusCode::UNAUTHORIZED.into_response());
	}

	let failure = state.failures.lock().unwrap_or_else(|err| err.into_inner()).pop_front();

	failure.map(|status| {
		StatusCode::from_u16(status)
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
			.into_response()
	})
}

fn render_page(state: &StubState, version: &str, index: usize, offset: usize) -> Value {
	let dataset = &state.datasets[index];
	let len = dataset.records.len();
	let end = offset.saturating_add(dataset.page_size).min(len);
	let records = dataset.records.get(offset..end).map(<[Value]>::to_vec).unwrap_or_default();
	let next = (end < len)
		.then(|| format!("/services/data/{version}/query/{CURSOR_PREFIX}{index}-{end}"));
	let mut page = Map::new();

	page.insert("totalSize".to_string(), Value::from(dataset.declared_total.unwrap_or(len as u64)));
	page.insert("done".to_string(), Value::Bool(next.is_none()));
	page.insert("records".to_string(), Value::Array(records));

	if let Some(next) = next {
		page.insert("nextRecordsUrl".to_string(), Value::String(next));
	}

	Value::Object(page)
}

pub fn remote_config(base_url: &str) -> vigil_config::Remote {
	vigil_config::Remote {
		instance_url: base_url.to_string(),
		api_version: API_VERSION.to_string(),
		api_token: Some(TEST_TOKEN.to_string()),
		api_token_env: None,
		timeout_ms: 5_000,
		default_headers: Map::new(),
	}
}

pub fn config(base_url: &str) -> vigil_config::Config {
	vigil_config::Config {
		service: vigil_config::Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		remote: remote_config(base_url),
		retrieval: vigil_config::Retrieval {
			max_concurrency: 4,
			retry: vigil_config::Retry {
				max_attempts: 3,
				initial_backoff_ms: 1,
				max_backoff_ms: 5,
			},
		},
		triage: vigil_config::Triage {
			queue_owner_id: "00G_QUEUE".to_string(),
			investigation_policy: vigil_config::InvestigationPolicy::First,
		},
		reference: vigil_config::Reference { eea_path: eea_path() },
		cache: vigil_config::Cache::default(),
	}
}

/// Path of the EEA reference table shipped with the repository.
pub fn eea_path() -> PathBuf {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../data/eea_countries.json");

	path
}

/// `count` numbered records built by `make`, for pagination tests.
pub fn numbered_records(count: usize, make: impl Fn(usize) -> Value) -> Vec<Value> {
	(0..count).map(make).collect()
}
