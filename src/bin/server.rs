//! Frame Solver HTTP Server

use axum::{
    extract::Json,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use anyhow::Context;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use frame_solver::prelude::*;

const DEFAULT_PORT: u16 = 8086;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    model: ModelInput,
    #[serde(default)]
    case: Option<String>,
    #[serde(default)]
    options: Option<AnalysisOptions>,
}

impl AnalysisRequest {
    fn options(&self) -> AnalysisOptions {
        let options = self.options.clone().unwrap_or_default();
        match &self.case {
            Some(case) => options.with_case(case),
            None => options,
        }
    }
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn status_for(e: &SolverError) -> StatusCode {
    if e.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

async fn analyze(Json(request): Json<AnalysisRequest>) -> impl IntoResponse {
    let options = request.options();
    info!(
        "Analysis request: case '{}', {} nodes, {} elements",
        options.case_name,
        request.model.num_nodes(),
        request.model.num_elements()
    );

    // The solve is CPU bound; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || run_analysis(&request.model, &options)).await;

    match result {
        Ok(Ok(output)) => (StatusCode::OK, Json(output)),
        Ok(Err(e)) => {
            error!("Analysis failed: {}", e);
            (status_for(&e), Json(AnalysisOutput::failed(&e)))
        }
        Err(join) => {
            let e = SolverError::Internal(join.to_string());
            error!("Analysis task aborted: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(AnalysisOutput::failed(&e)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/analyze", post(analyze))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let port = match std::env::var("FRAME_SOLVER_PORT") {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("FRAME_SOLVER_PORT is not a port: {}", value))?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("frame-server {} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
