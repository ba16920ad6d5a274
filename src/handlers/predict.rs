//! Predict handler
//!
//! Validates the form input, then runs one interaction on the blocking pool.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::logic::explain::{FeatureContribution, Waterfall};
use crate::logic::features::{CategoryFallback, NamedValue, RawInput};
use crate::logic::model::{InferenceStats, ModelContext};
use crate::logic::pipeline::{Interaction, InteractionState, PipelineError};
use crate::{AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(nested)]
    pub input: RawInput,

    /// Also return the attribution for this prediction
    #[serde(default)]
    pub explain: bool,

    #[validate(range(min = 1, max = 20))]
    pub max_display: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AttributionResponse {
    pub base_value: f64,
    pub prediction: f64,
    pub contributions: Vec<FeatureContribution>,
    pub waterfall: Waterfall,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub interaction_id: Uuid,
    pub state: InteractionState,
    pub price: f64,
    pub price_display: String,
    pub method: String,
    pub inference_time_us: u64,
    pub record: Vec<NamedValue>,
    pub fallbacks: Vec<CategoryFallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AttributionResponse>,
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let context = state.context.clone();
    let stats = state.stats.clone();
    let max_display = req.max_display.unwrap_or(state.config.waterfall_max_display);

    let response = tokio::task::spawn_blocking(move || {
        run_interaction(&context, &stats, &req.input, req.explain, max_display)
    })
    .await??;

    Ok(Json(response))
}

fn run_interaction(
    context: &ModelContext,
    stats: &InferenceStats,
    input: &RawInput,
    explain: bool,
    max_display: usize,
) -> Result<PredictResponse, PipelineError> {
    let mut interaction = Interaction::new(context);

    let prediction = interaction.submit(input)?.clone();
    stats.record(&prediction);

    let attribution = if explain {
        let attribution = interaction.explain()?;
        Some(AttributionResponse {
            base_value: attribution.base_value,
            prediction: attribution.prediction(),
            contributions: attribution.contributions.clone(),
            waterfall: attribution.waterfall(max_display),
        })
    } else {
        None
    };

    Ok(PredictResponse {
        interaction_id: interaction.id(),
        state: interaction.state(),
        price: prediction.price,
        price_display: format_currency(prediction.price),
        method: prediction.method,
        inference_time_us: prediction.inference_time_us,
        record: interaction.record().map(|r| r.named_values()).unwrap_or_default(),
        fallbacks: interaction.fallbacks().to_vec(),
        attribution,
    })
}

/// `$1,234,567.89`, with a leading `-` for negatives
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}
