//! Raw Input - What the form collects
//!
//! Ranges here mirror the form controls. They are checked at the HTTP
//! boundary via `validator`; the feature builder never re-validates.
//! Categorical labels are deliberately left unchecked so the builder's
//! baseline fallback stays the single place that handles them.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::category::{FLAT_TYPE, STOREY_RANGE, TRANSACTION_YEARS};

/// User-facing structured input for one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawInput {
    #[validate(range(min = 1.27, max = 1.46))]
    pub latitude: f64,

    #[validate(range(min = 103.69, max = 103.99))]
    pub longitude: f64,

    /// Metres to the nearest MRT station
    #[validate(range(min = 31.76, max = 3496.4))]
    pub closest_mrt_dist: f64,

    /// Metres to the Central Business District
    #[validate(range(min = 592.12, max = 20225.1))]
    pub cbd_dist: f64,

    #[validate(range(min = 31.0, max = 189.0))]
    pub floor_area_sqm: f64,

    /// Lease years remaining
    #[validate(range(min = 52, max = 98))]
    pub years_remaining: u16,

    /// One of [`TRANSACTION_YEARS`], which is contiguous
    #[validate(range(min = 2012, max = 2014))]
    pub transaction_year: u16,

    pub flat_type: String,

    pub storey_range: String,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            latitude: 1.37,
            longitude: 103.84,
            closest_mrt_dist: 763.94,
            cbd_dist: 12667.79,
            floor_area_sqm: 94.73,
            years_remaining: 75,
            transaction_year: TRANSACTION_YEARS[0],
            flat_type: FLAT_TYPE.baseline().to_string(),
            storey_range: STOREY_RANGE.baseline().to_string(),
        }
    }
}

// ============================================================================
// INPUT DOMAINS (for the schema endpoint)
// ============================================================================

/// Domain of one numeric input, as the form should render it
#[derive(Debug, Clone, Serialize)]
pub struct NumericDomain {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Slider increment
    pub step: f64,
    pub help: &'static str,
}

/// Numeric input domains in form order
pub const NUMERIC_DOMAINS: &[NumericDomain] = &[
    NumericDomain {
        name: "latitude",
        label: "Latitude",
        min: 1.27,
        max: 1.46,
        default: 1.37,
        step: 0.001,
        help: "Latitude of the flat's location",
    },
    NumericDomain {
        name: "longitude",
        label: "Longitude",
        min: 103.69,
        max: 103.99,
        default: 103.84,
        step: 0.001,
        help: "Longitude of the flat's location",
    },
    NumericDomain {
        name: "closest_mrt_dist",
        label: "Closest MRT Distance",
        min: 31.76,
        max: 3496.4,
        default: 763.94,
        step: 0.01,
        help: "Distance to the nearest MRT station in meters",
    },
    NumericDomain {
        name: "cbd_dist",
        label: "CBD Distance",
        min: 592.12,
        max: 20225.1,
        default: 12667.79,
        step: 0.01,
        help: "Distance to the Central Business District in meters",
    },
    NumericDomain {
        name: "floor_area_sqm",
        label: "Floor Area (sqm)",
        min: 31.0,
        max: 189.0,
        default: 94.73,
        step: 0.01,
        help: "Floor area of the flat in square meters",
    },
    NumericDomain {
        name: "years_remaining",
        label: "Years Remaining",
        min: 52.0,
        max: 98.0,
        default: 75.0,
        step: 1.0,
        help: "Years remaining on the flat's lease",
    },
];

/// Transaction year choice, as the form should render it
#[derive(Debug, Clone, Serialize)]
pub struct YearDomain {
    pub name: &'static str,
    pub label: &'static str,
    pub options: &'static [u16],
    pub default: u16,
    pub help: &'static str,
}

pub const TRANSACTION_YEAR_DOMAIN: YearDomain = YearDomain {
    name: "transaction_year",
    label: "Transaction Year",
    options: TRANSACTION_YEARS,
    default: 2012,
    help: "Year of the resale transaction",
};
