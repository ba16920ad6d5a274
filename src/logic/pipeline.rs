//! Inference & Explanation Pipeline
//!
//! One `Interaction` per form submission:
//!
//! ```text
//! Idle --submit--> Predicted --explain--> Explained
//!                      ^                      |
//!                      +-------submit---------+
//! ```
//!
//! `explain` appends the submitted record to a private copy of the reference
//! sample, runs the explainer over the whole batch and keeps the row at
//! `reference.len()`. The shared context is only ever read.

use serde::Serialize;
use tracing::Span;
use uuid::Uuid;

use crate::logic::explain::{attribution_at, AttributionResult, ExplainError};
use crate::logic::features::{BuiltRecord, CategoryFallback, FeatureRecord, FeatureVectorBuilder, RawInput};
use crate::logic::model::{
    predict_record, InferenceError, ModelContext, PredictionResult, TableError,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("no prediction to explain; submit an input first")]
    NotPredicted,

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Explain(#[from] ExplainError),

    #[error("reference sample cannot take the record: {0}")]
    Reference(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    Idle,
    Predicted,
    Explained,
}

enum Stage {
    Idle,
    Predicted {
        built: BuiltRecord,
        prediction: PredictionResult,
    },
    Explained {
        built: BuiltRecord,
        prediction: PredictionResult,
        attribution: AttributionResult,
    },
}

pub struct Interaction<'a> {
    id: Uuid,
    context: &'a ModelContext,
    stage: Stage,
    span: Span,
}

impl<'a> Interaction<'a> {
    pub fn new(context: &'a ModelContext) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            context,
            stage: Stage::Idle,
            span: tracing::info_span!("interaction", id = %id),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> InteractionState {
        match self.stage {
            Stage::Idle => InteractionState::Idle,
            Stage::Predicted { .. } => InteractionState::Predicted,
            Stage::Explained { .. } => InteractionState::Explained,
        }
    }

    /// Build the record and call the predictor once.
    ///
    /// Valid from any state. A failed submission leaves the interaction Idle.
    pub fn submit(&mut self, input: &RawInput) -> Result<&PredictionResult, PipelineError> {
        let _guard = self.span.clone().entered();
        self.stage = Stage::Idle;

        let built = FeatureVectorBuilder::build_checked(input);
        let prediction = predict_record(self.context.predictor.as_ref(), &built.record)
            .inspect_err(|e| tracing::error!(error = %e, "Prediction failed"))?;

        tracing::info!(
            price = prediction.price,
            latency_us = prediction.inference_time_us,
            fallbacks = built.fallbacks.len(),
            "Prediction complete"
        );

        self.stage = Stage::Predicted { built, prediction };
        self.prediction().ok_or(PipelineError::NotPredicted)
    }

    /// Attribute the current prediction.
    ///
    /// Only valid after a successful `submit`. A failed explanation keeps the
    /// prediction, so the caller can still show the price.
    pub fn explain(&mut self) -> Result<&AttributionResult, PipelineError> {
        let _guard = self.span.clone().entered();

        let (built, prediction) = match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle => return Err(PipelineError::NotPredicted),
            Stage::Predicted { built, prediction } => (built, prediction),
            Stage::Explained { built, prediction, .. } => (built, prediction),
        };

        match explain_record(self.context, &built.record) {
            Ok(attribution) => {
                tracing::info!(
                    base_value = attribution.base_value,
                    reference_rows = self.context.reference.len(),
                    "Explanation complete"
                );
                self.stage = Stage::Explained { built, prediction, attribution };
                self.attribution().ok_or(PipelineError::NotPredicted)
            }
            Err(e) => {
                tracing::error!(error = %e, "Explanation failed");
                self.stage = Stage::Predicted { built, prediction };
                Err(e)
            }
        }
    }

    pub fn record(&self) -> Option<&FeatureRecord> {
        self.built().map(|b| &b.record)
    }

    pub fn fallbacks(&self) -> &[CategoryFallback] {
        self.built().map(|b| b.fallbacks.as_slice()).unwrap_or(&[])
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match &self.stage {
            Stage::Idle => None,
            Stage::Predicted { prediction, .. } | Stage::Explained { prediction, .. } => Some(prediction),
        }
    }

    pub fn attribution(&self) -> Option<&AttributionResult> {
        match &self.stage {
            Stage::Explained { attribution, .. } => Some(attribution),
            _ => None,
        }
    }

    fn built(&self) -> Option<&BuiltRecord> {
        match &self.stage {
            Stage::Idle => None,
            Stage::Predicted { built, .. } | Stage::Explained { built, .. } => Some(built),
        }
    }
}

/// Explain one record against the context's reference sample
pub fn explain_record(
    context: &ModelContext,
    record: &FeatureRecord,
) -> Result<AttributionResult, PipelineError> {
    let batch = context.reference.extended_with(record)?;
    let results = context.explainer.explain_table(&batch)?;
    Ok(attribution_at(results, context.reference.len())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::explain::{Explainer, TreeShapExplainer};
    use crate::logic::features::layout::FEATURE_COUNT;
    use crate::logic::model::fixtures::{self, toy_context, toy_price};
    use crate::logic::model::table::{FeatureTable, ReferenceSample};
    use crate::logic::model::tree::TreeEnsemble;

    fn four_room_mid_floor() -> RawInput {
        RawInput {
            flat_type: "4 ROOM".to_string(),
            storey_range: "11 TO 15".to_string(),
            transaction_year: 2013,
            floor_area_sqm: 95.0,
            ..RawInput::default()
        }
    }

    #[test]
    fn test_submit_predicts_once() {
        let context = toy_context(4);
        let mut interaction = Interaction::new(&context);
        assert_eq!(interaction.state(), InteractionState::Idle);

        let price = interaction.submit(&four_room_mid_floor()).unwrap().price;

        // 300k + 60k (area) + 35k (4 ROOM, 11 TO 15) + 8k (2013)
        assert_eq!(price, 403_000.0);
        assert_eq!(interaction.state(), InteractionState::Predicted);
        assert!(interaction.fallbacks().is_empty());
        assert_eq!(interaction.record().map(|r| r.values[fixtures::FOUR_ROOM]), Some(1.0));
    }

    #[test]
    fn test_explain_before_submit_fails() {
        let context = toy_context(3);
        let mut interaction = Interaction::new(&context);

        assert_eq!(interaction.explain().unwrap_err(), PipelineError::NotPredicted);
        assert_eq!(interaction.state(), InteractionState::Idle);
    }

    #[test]
    fn test_explained_row_is_the_user_row() {
        for size in [0usize, 1, 9] {
            let context = toy_context(size);
            let mut interaction = Interaction::new(&context);
            let price = interaction.submit(&four_room_mid_floor()).unwrap().price;

            let attribution = interaction.explain().unwrap().clone();
            assert_eq!(interaction.state(), InteractionState::Explained);

            // Additivity only holds for the row we explained
            assert!((attribution.prediction() - price).abs() < 1e-6, "size {size}");

            let record = interaction.record().unwrap();
            for (c, &v) in attribution.contributions.iter().zip(record.values.iter()) {
                assert_eq!(c.feature_value, v);
            }
        }
    }

    #[test]
    fn test_reference_sample_unchanged() {
        let context = toy_context(5);
        let snapshot = context.reference.clone();

        for _ in 0..3 {
            let mut interaction = Interaction::new(&context);
            interaction.submit(&four_room_mid_floor()).unwrap();
            interaction.explain().unwrap();
            interaction.explain().unwrap();
        }

        assert_eq!(context.reference, snapshot);
        assert_eq!(context.reference.len(), 5);
    }

    #[test]
    fn test_resubmit_returns_to_predicted() {
        let context = toy_context(2);
        let mut interaction = Interaction::new(&context);

        interaction.submit(&four_room_mid_floor()).unwrap();
        interaction.explain().unwrap();
        interaction.submit(&RawInput::default()).unwrap();

        assert_eq!(interaction.state(), InteractionState::Predicted);
        assert!(interaction.attribution().is_none());
    }

    #[test]
    fn test_deterministic_across_interactions() {
        let context = toy_context(6);
        let input = four_room_mid_floor();

        let mut first = Interaction::new(&context);
        let mut second = Interaction::new(&context);
        let a = first.submit(&input).unwrap().price;
        let b = second.submit(&input).unwrap().price;
        assert_eq!(a.to_bits(), b.to_bits());

        let ea = first.explain().unwrap().clone();
        let eb = second.explain().unwrap().clone();
        assert_eq!(ea, eb);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_unknown_label_falls_back_and_still_predicts() {
        let context = toy_context(2);
        let mut interaction = Interaction::new(&context);
        let input = RawInput { flat_type: "4-ROOM".to_string(), ..four_room_mid_floor() };

        let price = interaction.submit(&input).unwrap().price;
        assert_eq!(price, toy_price(interaction.record().unwrap()));
        assert_eq!(interaction.fallbacks().len(), 1);
        assert_eq!(interaction.fallbacks()[0].field, "flat_type");
    }

    #[test]
    fn test_failure_leaves_context_usable() {
        // Explainer fitted on a narrower table than the layout
        let narrow = TreeEnsemble {
            base_score: 0.0,
            n_features: 3,
            feature_names: None,
            trees: vec![],
        };
        let explainer = TreeShapExplainer::new(narrow, vec![vec![0.0; 3]]).unwrap();
        let context = ModelContext::from_parts(
            Box::new(fixtures::toy_ensemble()),
            Box::new(explainer),
            fixtures::reference_sample(3),
        );

        let mut interaction = Interaction::new(&context);
        interaction.submit(&four_room_mid_floor()).unwrap();
        let err = interaction.explain().unwrap_err();
        assert_eq!(
            err,
            PipelineError::Explain(ExplainError::Input(InferenceError::DimensionMismatch {
                expected: 3,
                actual: FEATURE_COUNT,
            }))
        );

        // Prediction survives, and a fresh interaction still works
        assert_eq!(interaction.state(), InteractionState::Predicted);
        assert_eq!(interaction.prediction().map(|p| p.price), Some(403_000.0));

        let mut next = Interaction::new(&context);
        let expected = toy_price(&FeatureVectorBuilder::build(&RawInput::default()));
        assert_eq!(next.submit(&RawInput::default()).unwrap().price, expected);
    }

    #[test]
    fn test_schema_drift_in_reference() {
        let mut columns = fixtures::layout_columns();
        columns.swap(7, 8);
        let reference = ReferenceSample::new(
            FeatureTable::from_rows(columns, fixtures::reference_rows(2)).unwrap(),
        );
        let explainer = TreeShapExplainer::from_file(fixtures::explainer_file()).unwrap();
        assert_eq!(explainer.kind(), "interventional_tree");

        let context =
            ModelContext::from_parts(Box::new(fixtures::toy_ensemble()), Box::new(explainer), reference);
        let mut interaction = Interaction::new(&context);
        interaction.submit(&RawInput::default()).unwrap();

        assert!(matches!(interaction.explain(), Err(PipelineError::Reference(_))));
    }
}
