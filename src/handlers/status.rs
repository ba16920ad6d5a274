//! Model status handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::features::layout_hash;
use crate::logic::model::ArtifactMetadata;
use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub predictor: &'static str,
    pub explainer: &'static str,
    pub reference_rows: usize,
    pub layout_hash: u32,
    pub artifacts: Vec<ArtifactMetadata>,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
    pub environment: String,
}

pub async fn get(State(state): State<AppState>) -> Json<StatusResponse> {
    let context = &state.context;

    Json(StatusResponse {
        predictor: context.predictor.kind(),
        explainer: context.explainer.kind(),
        reference_rows: context.reference.len(),
        layout_hash: layout_hash(),
        artifacts: context.artifacts.clone(),
        inference_count: state.stats.count(),
        avg_latency_ms: state.stats.avg_latency_ms(),
        environment: state.config.environment.clone(),
    })
}
