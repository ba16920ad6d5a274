//! Input schema handler
//!
//! Everything a form needs to render its controls.

use axum::Json;
use serde::Serialize;

use crate::logic::features::{
    CategoricalField, LayoutInfo, NumericDomain, RawInput, YearDomain, FLAT_TYPE,
    NUMERIC_DOMAINS, STOREY_RANGE, TRANSACTION_YEAR_DOMAIN,
};

#[derive(Serialize)]
pub struct SchemaResponse {
    pub layout: LayoutInfo,
    pub numeric: &'static [NumericDomain],
    pub transaction_year: YearDomain,
    pub categorical: [CategoricalField; 2],
    pub defaults: RawInput,
}

pub async fn get() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        layout: LayoutInfo::current(),
        numeric: NUMERIC_DOMAINS,
        transaction_year: TRANSACTION_YEAR_DOMAIN,
        categorical: [FLAT_TYPE, STOREY_RANGE],
        defaults: RawInput::default(),
    })
}
