//! Axum web server with WebSocket streaming for a network view.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use netplay_topology::{EdgeDescriptor, NodeDescriptor, PagePosition};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::broadcast::{BroadcastBackend, BroadcastNotices, BroadcastRenderer};
use crate::collaborators::Collaborators;
use crate::config::ViewConfig;
use crate::controller::ClickOutcome;
use crate::error::{Error, Result};
use crate::events::{Job, PacketCollection, ViewEvent};
use crate::network::{NetworkRecord, NetworkStore};
use crate::placement::DropOutcome;
use crate::playback::{NetworkId, PlaybackState, PlaybackStatus};
use crate::simulation::{Completion, SimulationResult};
use crate::timers::TokioScheduler;
use crate::view::{ControlId, NetworkView, ViewSnapshot};

const EVENT_CAPACITY: usize = 1024;

/// Shared application state.
pub struct AppState {
    view: Mutex<NetworkView>,
    store: NetworkStore,
    events: broadcast::Sender<ViewEvent>,
    network: NetworkId,
}

impl AppState {
    /// Tell frontends about a state change made by a request.
    fn announce(&self, before: PlaybackState, view: &NetworkView) {
        let after = view.state();
        if before != after {
            let _ = self.events.send(ViewEvent::StateChanged { state: after });
        }
    }
}

/// Server for one network view.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    /// Open the stored network `guid` and wire its view to a broadcast
    /// channel. Persistence writes go back into `store`.
    pub fn new(config: &ViewConfig, store: NetworkStore, guid: NetworkId) -> Result<Self> {
        let record = store.get(&guid)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let collaborators = Collaborators::new(
            BroadcastRenderer::new(events.clone(), config.frame_interval),
            store.clone(),
            BroadcastBackend::new(events.clone()),
            BroadcastNotices::new(events.clone()),
        );
        let view = NetworkView::load(&record, config, TokioScheduler::new(), collaborators);
        info!(network = %guid, title = %record.title, state = %view.state(), "network opened");

        Ok(Self {
            state: Arc::new(AppState {
                view: Mutex::new(view),
                store,
                events,
                network: guid,
            }),
        })
    }

    pub fn network(&self) -> &NetworkId {
        &self.state.network
    }

    /// Receive everything the view publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.state.events.subscribe()
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            // View
            .route("/api/status", get(status_handler))
            .route("/api/view", get(view_handler))
            .route("/api/drop", post(drop_handler))
            .route("/api/controls/{control}/click", post(click_handler))
            .route("/api/simulation/complete", post(complete_handler))
            .route("/api/jobs", post(job_handler))
            // Stored network
            .route("/api/network", get(network_handler).delete(delete_handler))
            .route("/api/network/export", get(export_handler))
            .route("/api/network/shared", get(shared_handler))
            .route("/api/network/share", post(share_handler))
            .route("/api/network/nodes_edges", post(nodes_edges_handler))
            .route("/api/network/move_nodes", post(move_nodes_handler))
            .route("/api/network/title", post(title_handler))
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server on the given port.
    pub async fn serve(self, port: u16) -> std::result::Result<(), std::io::Error> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Visualization server running on http://localhost:{}", port);
        axum::serve(listener, self.router()).await
    }
}

fn reject(err: Error) -> StatusCode {
    let status = match &err {
        Error::NetworkNotFound(_) => StatusCode::NOT_FOUND,
        Error::NotShared(_) => StatusCode::FORBIDDEN,
        Error::InvalidTransition { .. } => StatusCode::CONFLICT,
        Error::InvalidJob(_) | Error::Topology(_) | Error::Serialization(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Config(_) | Error::Persistence(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    warn!(error = %err, status = status.as_u16(), "request failed");
    status
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let view = state.view.lock().await;
    Json(view.status())
}

async fn view_handler(State(state): State<Arc<AppState>>) -> Json<ViewSnapshot> {
    let view = state.view.lock().await;
    Json(view.snapshot())
}

#[derive(Deserialize)]
struct DropRequest {
    device: String,
    x: f64,
    y: f64,
}

async fn drop_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DropRequest>,
) -> Json<DropOutcome> {
    let mut view = state.view.lock().await;
    let before = view.state();
    let outcome = view.drop_device(&req.device, PagePosition::new(req.x, req.y));
    state.announce(before, &view);
    Json(outcome)
}

#[derive(Serialize)]
struct ClickResponse {
    outcome: ClickOutcome,
    view: ViewSnapshot,
}

async fn click_handler(
    State(state): State<Arc<AppState>>,
    Path(control): Path<ControlId>,
) -> std::result::Result<Json<ClickResponse>, StatusCode> {
    if control == ControlId::Shared {
        state.store.shared(&state.network).map_err(reject)?;
    }
    let mut view = state.view.lock().await;
    let before = view.state();
    let outcome = view.click(control).map_err(reject)?;
    state.announce(before, &view);
    if outcome == ClickOutcome::SimulationStarted {
        state.store.begin_simulation(&state.network).map_err(reject)?;
    }
    Ok(Json(ClickResponse {
        outcome,
        view: view.snapshot(),
    }))
}

#[derive(Deserialize)]
struct CompleteRequest {
    /// Defaults to the open network
    network: Option<NetworkId>,
    #[serde(default)]
    packets: PacketCollection,
}

#[derive(Serialize)]
struct CompleteResponse {
    completion: Completion,
}

async fn complete_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteRequest>,
) -> std::result::Result<Json<CompleteResponse>, StatusCode> {
    let network = req.network.unwrap_or_else(|| state.network.clone());
    let packets = req.packets.clone();

    let mut view = state.view.lock().await;
    let before = view.state();
    let completion = view
        .complete_simulation(SimulationResult::new(network, req.packets))
        .map_err(reject)?;
    state.announce(before, &view);
    if completion == Completion::Accepted {
        state
            .store
            .finish_simulation(&state.network, packets)
            .map_err(reject)?;
    }
    Ok(Json(CompleteResponse { completion }))
}

async fn job_handler(
    State(state): State<Arc<AppState>>,
    Json(job): Json<Job>,
) -> std::result::Result<StatusCode, StatusCode> {
    let mut view = state.view.lock().await;
    state.store.add_job(&state.network, job.clone()).map_err(reject)?;
    view.add_job(job);
    Ok(StatusCode::CREATED)
}

async fn network_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<NetworkRecord>, StatusCode> {
    state.store.get(&state.network).map(Json).map_err(reject)
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<StatusCode, StatusCode> {
    state.store.delete(&state.network).map_err(reject)?;
    info!(network = %state.network, "network deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn export_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<impl IntoResponse, StatusCode> {
    let json = state.store.export(&state.network).map_err(reject)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}

async fn shared_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<NetworkRecord>, StatusCode> {
    state.store.shared(&state.network).map(Json).map_err(reject)
}

#[derive(Deserialize)]
struct ShareRequest {
    share_mode: bool,
}

async fn share_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ShareRequest>,
) -> std::result::Result<StatusCode, StatusCode> {
    state
        .store
        .set_share_mode(&state.network, req.share_mode)
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct NodesEdgesRequest {
    #[serde(default)]
    nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    edges: Vec<EdgeDescriptor>,
}

#[derive(Serialize)]
struct NodesEdgesResponse {
    pruned_jobs: usize,
}

async fn nodes_edges_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NodesEdgesRequest>,
) -> std::result::Result<Json<NodesEdgesResponse>, StatusCode> {
    let mut view = state.view.lock().await;
    let before = view.state();
    if !view.replace_topology(req.nodes.clone(), req.edges.clone()) {
        return Err(StatusCode::CONFLICT);
    }
    state.announce(before, &view);
    let pruned_jobs = state
        .store
        .replace_topology(&state.network, &req.nodes, &req.edges)
        .map_err(reject)?;
    Ok(Json(NodesEdgesResponse { pruned_jobs }))
}

#[derive(Deserialize)]
struct MoveNodesRequest {
    nodes: Vec<NodeDescriptor>,
}

async fn move_nodes_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveNodesRequest>,
) -> std::result::Result<StatusCode, StatusCode> {
    let mut view = state.view.lock().await;
    view.move_nodes(&req.nodes).map_err(reject)?;
    let nodes = view.context().topology().nodes();
    state.store.move_nodes(&state.network, nodes).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct TitleRequest {
    title: String,
}

async fn title_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TitleRequest>,
) -> std::result::Result<StatusCode, StatusCode> {
    state
        .store
        .update_title(&state.network, &req.title)
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Hello {
    Snapshot { view: ViewSnapshot },
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, value: &T) -> std::result::Result<(), axum::Error> {
    let json = serde_json::to_string(value).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before the snapshot so no event falls in between.
    let mut events = state.events.subscribe();
    let snapshot = state.view.lock().await.snapshot();
    if let Err(e) = send_json(&mut socket, &Hello::Snapshot { view: snapshot }).await {
        warn!("Failed to send initial snapshot: {}", e);
        return;
    }
    info!(network = %state.network, "frontend connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(e) = send_json(&mut socket, &event).await {
                            debug!("frontend went away: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "frontend fell behind, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    info!(network = %state.network, "frontend disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server() -> (VisServer, NetworkStore) {
        let store = NetworkStore::new();
        let guid = store.create("lab");
        let server = VisServer::new(&ViewConfig::default(), store.clone(), guid).unwrap();
        (server, store)
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read(response).await
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read(response).await
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[test]
    fn unknown_network_is_rejected() {
        let err = VisServer::new(&ViewConfig::default(), NetworkStore::new(), NetworkId::new("x"));
        assert!(matches!(err, Err(Error::NetworkNotFound(_))));
    }

    #[tokio::test]
    async fn index_is_served() {
        let (server, _) = server();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_starts_idle() {
        let (server, _) = server();
        let (status, body) = get_json(&server.router(), "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");
        assert_eq!(body["node_count"], 0);
    }

    #[tokio::test]
    async fn drop_persists_and_redraws() {
        let (server, store) = server();
        let mut rx = server.subscribe();
        let router = server.router();

        let (_, body) = post_json(&router, "/api/drop", json!({"device": "host", "x": 50.0, "y": 60.0})).await;

        assert_eq!(body["outcome"], "added");
        assert_eq!(body["id"], "host_1");
        assert_eq!(store.get(server.network()).unwrap().document.nodes.len(), 1);
        assert!(matches!(rx.try_recv(), Ok(ViewEvent::Redraw { .. })));

        let (_, view) = get_json(&router, "/api/view").await;
        assert_eq!(view["nodes"][0]["data"]["id"], "host_1");
    }

    #[tokio::test]
    async fn click_without_jobs_notifies() {
        let (server, _) = server();
        let mut rx = server.subscribe();

        let (status, body) = post_json(&server.router(), "/api/controls/primary/click", json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "no_jobs");
        assert!(matches!(rx.try_recv(), Ok(ViewEvent::Notice { .. })));
    }

    #[tokio::test]
    async fn unknown_control_is_bad_request() {
        let (server, _) = server();
        let (status, _) = post_json(&server.router(), "/api/controls/third/click", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simulate_complete_and_play() {
        let (server, store) = server();
        let router = server.router();
        let guid = server.network().clone();

        post_json(&router, "/api/drop", json!({"device": "host", "x": 0.0, "y": 0.0})).await;
        let (status, _) = post_json(
            &router,
            "/api/jobs",
            json!({"id": "j1", "host_id": "host_1", "job_id": 0, "print_cmd": "ping"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = post_json(&router, "/api/controls/primary/click", json!({})).await;
        assert_eq!(body["outcome"], "simulation_started");
        assert_eq!(body["view"]["shared"]["disabled"], true);
        assert!(store.get(&guid).unwrap().simulating);

        let frames = json!([[{"id": "p", "label": "ARP", "source": "host_1", "target": "host_1"}]]);
        let (_, body) = post_json(&router, "/api/simulation/complete", json!({"packets": frames})).await;
        assert_eq!(body["completion"], "accepted");
        let record = store.get(&guid).unwrap();
        assert!(!record.simulating);
        assert_eq!(record.document.packets.frame_count(), 1);

        store.set_share_mode(&guid, true).unwrap();
        let (_, body) = post_json(&router, "/api/controls/shared/click", json!({})).await;
        assert_eq!(body["outcome"], "playback_started");
        assert_eq!(body["view"]["primary"]["label"], "Stop");

        let (_, body) = post_json(&router, "/api/controls/primary/click", json!({})).await;
        assert_eq!(body["view"]["state"], "ready");

        let (_, counts) = get_json(&router, "/api/status").await;
        assert_eq!(counts["pending_timers"], 0);
    }

    #[tokio::test]
    async fn shared_control_needs_share_mode() {
        let (server, store) = server();
        let router = server.router();
        post_json(&router, "/api/drop", json!({"device": "host", "x": 0.0, "y": 0.0})).await;
        let frames = json!([[{"id": "p", "label": "ARP", "source": "host_1", "target": "host_1"}]]);
        post_json(
            &router,
            "/api/jobs",
            json!({"id": "j1", "host_id": "host_1", "job_id": 0, "print_cmd": "ping"}),
        )
        .await;
        post_json(&router, "/api/controls/primary/click", json!({})).await;
        post_json(&router, "/api/simulation/complete", json!({"packets": frames})).await;

        let (status, _) = post_json(&router, "/api/controls/shared/click", json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, counts) = get_json(&router, "/api/status").await;
        assert_eq!(counts["state"], "ready");

        store.set_share_mode(server.network(), true).unwrap();
        let (status, body) = post_json(&router, "/api/controls/shared/click", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "playback_started");
    }

    #[tokio::test]
    async fn shared_record_follows_share_mode() {
        let (server, store) = server();
        let router = server.router();

        let (status, _) = get_json(&router, "/api/network/shared").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_json(&router, "/api/network/share", json!({"share_mode": true})).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(store.get(server.network()).unwrap().share_mode);

        let (status, record) = get_json(&router, "/api/network/shared").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["title"], "lab");

        post_json(&router, "/api/network/share", json!({"share_mode": false})).await;
        let (status, _) = get_json(&router, "/api/network/shared").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn export_returns_the_document() {
        let (server, _) = server();
        let router = server.router();
        post_json(&router, "/api/drop", json!({"device": "l1_hub", "x": 0.0, "y": 0.0})).await;

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/api/network/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let (status, doc) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["nodes"][0]["data"]["id"], "l1hub1");
    }

    #[tokio::test]
    async fn deleted_network_is_gone() {
        let (server, store) = server();
        let router = server.router();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/network")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.is_empty());

        let (status, _) = get_json(&router, "/api/network").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = post_json(&router, "/api/controls/shared/click", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stale_completion_is_ignored() {
        let (server, store) = server();
        let frames = json!([[{"id": "p", "label": "ARP", "source": "a", "target": "b"}]]);
        let (_, body) = post_json(&server.router(), "/api/simulation/complete", json!({"packets": frames})).await;
        assert_eq!(body["completion"], "stale");
        assert!(store.get(server.network()).unwrap().document.packets.is_empty());
    }

    #[tokio::test]
    async fn job_on_switch_is_rejected() {
        let (server, _) = server();
        let router = server.router();
        post_json(&router, "/api/drop", json!({"device": "l2_switch", "x": 0.0, "y": 0.0})).await;

        let (status, _) = post_json(
            &router,
            "/api/jobs",
            json!({"id": "j1", "host_id": "l2sw1", "job_id": 0, "print_cmd": "ping"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn nodes_edges_prunes_jobs() {
        let (server, store) = server();
        let router = server.router();
        post_json(&router, "/api/drop", json!({"device": "host", "x": 0.0, "y": 0.0})).await;
        post_json(
            &router,
            "/api/jobs",
            json!({"id": "j1", "host_id": "host_1", "job_id": 0, "print_cmd": "ping"}),
        )
        .await;

        let (status, body) = post_json(&router, "/api/network/nodes_edges", json!({"nodes": [], "edges": []})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pruned_jobs"], 1);
        assert!(store.get(server.network()).unwrap().document.jobs.is_empty());
        let (_, counts) = get_json(&router, "/api/status").await;
        assert_eq!(counts["job_count"], 0);
    }

    #[tokio::test]
    async fn blank_title_is_ignored() {
        let (server, store) = server();
        let router = server.router();

        let (status, _) = post_json(&router, "/api/network/title", json!({"title": "  "})).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.get(server.network()).unwrap().title, "lab");

        post_json(&router, "/api/network/title", json!({"title": "core"})).await;
        let (_, record) = get_json(&router, "/api/network").await;
        assert_eq!(record["title"], "core");
    }

    #[tokio::test]
    async fn loads_ready_network() {
        let store = NetworkStore::new();
        let guid = store.import(
            "saved",
            r#"{"packets": [[{"id": "p", "label": "ARP", "source": "a", "target": "b"}]]}"#,
        )
        .unwrap();

        let server = VisServer::new(&ViewConfig::default(), store, guid).unwrap();
        let view = server.state.view.lock().await;
        assert_eq!(view.state(), PlaybackState::Ready);
    }
}
