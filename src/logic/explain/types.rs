use serde::{Deserialize, Serialize};

/// Signed contribution of one column to a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    /// Value of the column in the explained row
    pub feature_value: f64,
    /// Push away from the base value, in price units
    pub contribution: f64,
}

/// Attribution for one explained row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Expected model output over the explainer's background
    pub base_value: f64,
    /// One entry per column, in column order
    pub contributions: Vec<FeatureContribution>,
}

impl AttributionResult {
    /// `base_value + Σ contributions`; equals the model output for the row
    pub fn prediction(&self) -> f64 {
        self.base_value + self.contributions.iter().map(|c| c.contribution).sum::<f64>()
    }

    /// Contributions by |contribution| descending; ties keep column order
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut ranked: Vec<&FeatureContribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }
}
