use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::block::Block;
use crate::chain::{Blockchain, StarRequest};
use crate::error::ChainError;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    fn bad_request(message: &str, detail: impl Into<Option<String>>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST.into(),
            message: message.to_string(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request("could not decode request body", value.body_text())
    }
}

impl From<ChainError> for ApiError {
    fn from(value: ChainError) -> Self {
        if value.is_not_found() {
            Self {
                status: StatusCode::NOT_FOUND.into(),
                message: "block not found".to_string(),
                detail: Some(value.to_string()),
            }
        } else {
            Self::bad_request("request rejected by the registry", value.to_string())
        }
    }
}

/// Wire form of a block. Hashes are lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDto {
    pub body: String,
    pub hash: String,
    pub height: u64,
    pub owner: String,
    pub previous_block_hash: Option<String>,
    pub time: i64,
}

impl From<&Block> for BlockDto {
    fn from(block: &Block) -> Self {
        Self {
            body: String::from_utf8_lossy(&block.data()).into_owned(),
            hash: hex::encode(block.hash()),
            height: block.height(),
            owner: block.owner().to_string(),
            previous_block_hash: block.previous_hash().map(hex::encode),
            time: block.timestamp(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddressDto {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct StarDto {
    pub address: String,
    pub message: String,
    pub star: serde_json::Value,
    pub signature: String,
}

/// HTTP API over a shared [`Blockchain`].
pub struct StarApi {
    router: Router,
}

impl StarApi {
    #[must_use]
    pub fn new(chain: Arc<Blockchain>) -> Self {
        let router = Router::new()
            .route("/hello", routing::get(hello))
            .route("/height", routing::get(get_height))
            .route("/block/{height}", routing::get(get_block_by_height))
            .route("/block/hash/{hash}", routing::get(get_block_by_hash))
            .route("/blocks/{address}", routing::get(get_stars))
            .route("/requestValidation", routing::post(request_validation))
            .route("/submitStar", routing::post(submit_star))
            .route("/validate", routing::get(validate_chain))
            .layer(TraceLayer::new_for_http())
            .with_state(chain);

        tracing::info!("REST API created");
        Self { router }
    }

    /// Run the HTTP server.
    ///
    /// # Errors
    /// Returns an error if the server fails to start.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        axum::serve(listener, self.router).await
    }
}

async fn hello() -> &'static str {
    "hello"
}

async fn get_height(State(chain): State<Arc<Blockchain>>) -> impl IntoResponse {
    Json(serde_json::json!({ "height": chain.height().await }))
}

async fn get_block_by_height(
    State(chain): State<Arc<Blockchain>>,
    Path(height): Path<String>,
) -> Result<Json<BlockDto>, ApiError> {
    let height: u64 = height.parse().map_err(|e: std::num::ParseIntError| {
        ApiError::bad_request("could not parse block height", format!("{height:?}: {e}"))
    })?;

    let block = chain.block_by_height(height).await?;
    Ok(Json(BlockDto::from(&block)))
}

async fn get_block_by_hash(
    State(chain): State<Arc<Blockchain>>,
    Path(hash): Path<String>,
) -> Result<Json<BlockDto>, ApiError> {
    if hash.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(ApiError::bad_request(
            "block hash must be lowercase hex",
            hash,
        ));
    }

    let bytes = hex::decode(&hash)
        .map_err(|e| ApiError::bad_request("could not decode block hash", e.to_string()))?;
    if bytes.len() != 32 {
        return Err(ApiError::bad_request(
            "block hash must be 64 hex characters",
            format!("got {} characters", hash.len()),
        ));
    }

    let block = chain.block_by_hash(&bytes).await?;
    Ok(Json(BlockDto::from(&block)))
}

async fn get_stars(
    State(chain): State<Arc<Blockchain>>,
    Path(address): Path<String>,
) -> Json<Vec<String>> {
    let stars = chain
        .stars_by_wallet_address(&address)
        .await
        .into_iter()
        .map(|star| String::from_utf8_lossy(&star).into_owned())
        .collect();
    Json(stars)
}

async fn request_validation(
    State(chain): State<Arc<Blockchain>>,
    body: Result<Json<AddressDto>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(body) = body?;
    chain
        .request_ownership_verification_message(&body.address)
        .await
        .map_err(ApiError::from)
}

async fn submit_star(
    State(chain): State<Arc<Blockchain>>,
    body: Result<Json<StarDto>, JsonRejection>,
) -> Result<(StatusCode, Json<BlockDto>), ApiError> {
    let Json(body) = body?;
    let star = serde_json::to_vec(&body.star)
        .map_err(|e| ApiError::bad_request("could not encode star data", e.to_string()))?;

    let request = StarRequest {
        address: body.address,
        message: body.message,
        star,
        signature: body.signature,
    };

    let block = chain.submit_star(&request).await.inspect_err(|e| {
        tracing::warn!("star submission failed: {e}");
    })?;
    Ok((StatusCode::CREATED, Json(BlockDto::from(&block))))
}

async fn validate_chain(State(chain): State<Arc<Blockchain>>) -> Json<Vec<String>> {
    Json(
        chain
            .validate_chain()
            .await
            .iter()
            .map(ToString::to_string)
            .collect(),
    )
}
