// src/api.rs
// The public HTTP interface. Thin adapters: parse/validate the body, call
// into the admission engine, format the reply.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, FromRequest, Path};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admission;
use crate::chain::{BallotEnvelope, Block, Election};
use crate::error::NodeError;
use crate::events::NodeInfo;
use crate::node::Node;

/// A 200 response body serialised as JSON with `Content-Type: text/json`,
/// matching the original node's `resp()` helper (which hardcodes this
/// content type rather than `application/json`).
struct Json200<T>(T);

impl<T: Serialize> IntoResponse for Json200<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        response
            .headers_mut()
            .insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("text/json"));
        response
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = match &self {
            NodeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            NodeError::NotFound(_) => StatusCode::NOT_FOUND,
            NodeError::Precondition(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// A `Json<T>` extractor whose rejection folds into `NodeError::BadRequest`
/// instead of axum's default plain-text parse error, so every malformed or
/// incomplete body this crate rejects produces the same `{"error": ...}`
/// envelope every other failure path in this file produces.
struct ValidatedJson<T>(T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for ValidatedJson<T>
where
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = NodeError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| NodeError::BadRequest(rejection.to_string()))?;
        Ok(ValidatedJson(value))
    }
}

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/alive", get(alive))
        .route("/get_nodes", get(get_nodes))
        .route("/elections", get(get_elections))
        .route("/election/:id", get(get_election))
        .route("/new_election", post(new_election))
        .route("/cast_ballot", post(cast_ballot))
        .route("/receive_ballot", post(receive_ballot))
        .route("/receive_election", post(receive_election))
        .route("/receive_block", post(receive_block))
        .route("/ws", get(ws_handler))
        .layer(Extension(node))
}

async fn alive() -> impl IntoResponse {
    StatusCode::OK
}

async fn get_nodes(
    Extension(node): Extension<Arc<Node>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    let requester_port: Option<u16> = headers
        .get("node-port")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    let (peers, info) = node.state.with(|inner| {
        if let Some(port) = requester_port {
            inner.peers.insert(port);
        }
        (inner.peer_list(), NodeInfo::from_state(inner))
    });
    node.events.emit(info);

    Json200(peers)
}

async fn get_elections(Extension(node): Extension<Arc<Node>>) -> impl IntoResponse {
    let elections: Vec<Election> = node
        .state
        .with(|inner| inner.elections.values().cloned().collect());
    Json200(elections)
}

async fn get_election(
    Extension(node): Extension<Arc<Node>>,
    Path(id): Path<Uuid>,
) -> Result<Json200<Vec<Block>>, NodeError> {
    node.state
        .with(|inner| inner.elections.get(&id).map(|e| e.chain.clone()))
        .map(Json200)
        .ok_or_else(|| NodeError::NotFound("unknown election".into()))
}

#[derive(Deserialize)]
struct NewElectionBody {
    label: String,
    candidates: Vec<String>,
    ballot_count: usize,
}

async fn new_election(
    Extension(node): Extension<Arc<Node>>,
    ValidatedJson(body): ValidatedJson<NewElectionBody>,
) -> Result<Json200<admission::NewElectionResponse>, NodeError> {
    admission::new_election(&node, body.label, body.candidates, body.ballot_count)
        .await
        .map(Json200)
}

#[derive(Deserialize)]
struct CastBallotBody {
    signing_key: String,
    candidates: Vec<String>,
    election: Uuid,
}

async fn cast_ballot(
    Extension(node): Extension<Arc<Node>>,
    ValidatedJson(body): ValidatedJson<CastBallotBody>,
) -> Result<Json200<BallotEnvelope>, NodeError> {
    admission::cast_ballot(&node, body.signing_key, body.candidates, body.election)
        .await
        .map(Json200)
}

#[derive(Deserialize)]
struct ReceiveBallotBody {
    ballot: BallotEnvelope,
}

async fn receive_ballot(
    Extension(node): Extension<Arc<Node>>,
    ValidatedJson(body): ValidatedJson<ReceiveBallotBody>,
) -> impl IntoResponse {
    admission::admit_ballot(&node, body.ballot).await;
    StatusCode::OK
}

#[derive(Deserialize)]
struct ReceiveElectionBody {
    election: Election,
}

async fn receive_election(
    Extension(node): Extension<Arc<Node>>,
    ValidatedJson(body): ValidatedJson<ReceiveElectionBody>,
) -> impl IntoResponse {
    admission::admit_election(&node, body.election).await;
    StatusCode::OK
}

#[derive(Deserialize)]
struct ReceiveBlockBody {
    block: Block,
}

async fn receive_block(
    Extension(node): Extension<Arc<Node>>,
    ValidatedJson(body): ValidatedJson<ReceiveBlockBody>,
) -> impl IntoResponse {
    admission::admit_block(&node, body.block).await;
    StatusCode::OK
}

/// Observability channel: on connect, push the current `NodeInfo`, then
/// forward every subsequent transition until the peer disconnects.
async fn ws_handler(
    Extension(node): Extension<Arc<Node>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, node))
}

async fn handle_socket(mut socket: WebSocket, node: Arc<Node>) {
    let mut rx = node.events.subscribe();

    let current = node.state.with(|inner| NodeInfo::from_state(inner));
    if send_info(&mut socket, &current).await.is_err() {
        return;
    }

    while let Ok(info) = rx.recv().await {
        if send_info(&mut socket, &info).await.is_err() {
            break;
        }
    }
}

async fn send_info(socket: &mut WebSocket, info: &NodeInfo) -> Result<(), axum::Error> {
    let text = serde_json::to_string(info).expect("NodeInfo is always serializable");
    socket.send(Message::Text(text)).await
}
