//! Waterfall - bar data for rendering one attribution

use serde::{Deserialize, Serialize};

use super::types::AttributionResult;
use crate::constants::DEFAULT_WATERFALL_MAX_DISPLAY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallBar {
    pub label: String,
    /// `None` for the folded remainder bar
    pub feature_value: Option<f64>,
    pub contribution: f64,
    /// Running total after this bar, starting from the base value
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waterfall {
    pub base_value: f64,
    pub prediction: f64,
    pub bars: Vec<WaterfallBar>,
}

impl AttributionResult {
    /// Top `max_display` contributions by magnitude, the rest folded into
    /// one "k other features" bar. `max_display == 0` uses the default.
    pub fn waterfall(&self, max_display: usize) -> Waterfall {
        let max_display = if max_display == 0 { DEFAULT_WATERFALL_MAX_DISPLAY } else { max_display };
        let ranked = self.ranked();

        let mut cumulative = self.base_value;
        let mut bars = Vec::with_capacity(max_display.min(ranked.len()) + 1);

        // Folding a single feature would just rename it
        let shown = if ranked.len() > max_display { max_display - 1 } else { ranked.len() };

        for c in &ranked[..shown] {
            cumulative += c.contribution;
            bars.push(WaterfallBar {
                label: c.name.clone(),
                feature_value: Some(c.feature_value),
                contribution: c.contribution,
                cumulative,
            });
        }

        let rest = &ranked[shown..];
        if !rest.is_empty() {
            let contribution = rest.iter().map(|c| c.contribution).sum::<f64>();
            cumulative += contribution;
            bars.push(WaterfallBar {
                label: format!("{} other features", rest.len()),
                feature_value: None,
                contribution,
                cumulative,
            });
        }

        Waterfall {
            base_value: self.base_value,
            prediction: self.prediction(),
            bars,
        }
    }
}
