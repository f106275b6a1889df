// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use bazaar_kernel::{PeerAddr, ProductRef};
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::api::*;
use crate::engine::SharedEngine;
use crate::errors::NodeError;

const ANONYMOUS_SELLER: &str = "anonimo";

pub fn build_router(state: SharedEngine) -> Router {
    Router::new()
        .route("/peer", post(announce_peer))
        .route("/peers", get(list_peers))
        .route("/peers/:addr", delete(remove_peer))
        .route("/produtos", get(list_products).post(insert_product))
        .route("/produtos/:id", put(update_product))
        .route("/comprar", put(purchase))
        .route("/eventos", get(list_events))
        // Observability
        .route("/estado", get(get_state))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `app` until `shutdown` is cancelled. Handlers see the caller's
/// socket address through `ConnectInfo`.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
}

fn caller_host(connect: &Option<ConnectInfo<SocketAddr>>) -> Option<String> {
    connect.as_ref().map(|ConnectInfo(addr)| match addr.ip() {
        IpAddr::V4(ip) => ip.to_string(),
        IpAddr::V6(ip) => format!("[{}]", ip),
    })
}

async fn announce_peer(
    State(state): State<SharedEngine>,
    connect: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<AnnouncePeerRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, NodeError> {
    let Json(req) = payload?;
    let host = req
        .host
        .or_else(|| caller_host(&connect))
        .ok_or_else(|| NodeError::InvalidInput("cannot determine peer host".into()))?;
    let addr = PeerAddr::new(host, req.port)?;

    state.write().await.insert_peer(addr)?;
    Ok(Json(SuccessResponse::message("cadastrado com sucesso")))
}

async fn list_peers(State(state): State<SharedEngine>) -> Json<PeersResponse> {
    let peers = state.read().await.peers();
    Json(PeersResponse { peers })
}

async fn remove_peer(
    State(state): State<SharedEngine>,
    Path(addr): Path<String>,
) -> Result<Json<SuccessResponse>, NodeError> {
    let addr: PeerAddr = addr.parse()?;
    state.write().await.delete_peer(&addr)?;
    Ok(Json(SuccessResponse::message("removido com sucesso")))
}

async fn list_products(State(state): State<SharedEngine>) -> Json<ProductsResponse> {
    let products = state.read().await.products();
    Json(ProductsResponse {
        products: products.into_iter().map(ProductView::from).collect(),
    })
}

async fn insert_product(
    State(state): State<SharedEngine>,
    connect: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<InsertProductRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, NodeError> {
    let Json(req) = payload?;
    let seller = req
        .seller
        .or_else(|| caller_host(&connect))
        .unwrap_or_else(|| ANONYMOUS_SELLER.to_string());

    let product = state
        .write()
        .await
        .insert_product(seller, req.name, req.quantity)?;
    Ok(Json(SuccessResponse::with_product(
        "cadastrado com sucesso",
        product,
    )))
}

async fn update_product(
    State(state): State<SharedEngine>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, NodeError> {
    let Json(req) = payload?;
    let reference: ProductRef = id.parse()?;

    let product = state
        .write()
        .await
        .update_product(&reference, req.name, req.quantity)?;
    Ok(Json(SuccessResponse::with_product(
        "atualizado com sucesso",
        product,
    )))
}

async fn purchase(
    State(state): State<SharedEngine>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, NodeError> {
    let Json(req) = payload?;

    let product = state.write().await.purchase(&req.id, req.quantity)?;
    Ok(Json(SuccessResponse::with_product(
        "comprado com sucesso",
        product,
    )))
}

async fn list_events(State(state): State<SharedEngine>) -> Json<EventsResponse> {
    let events = state.read().await.events();
    Json(EventsResponse { events })
}

async fn get_state(State(state): State<SharedEngine>) -> Result<Json<StateResponse>, NodeError> {
    let proof = state.read().await.state_proof()?;
    Ok(Json(proof.into()))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
