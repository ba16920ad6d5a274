//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! `Config::from_env` falls back to these when a variable is unset.

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default predictor artifact path
pub const DEFAULT_MODEL_PATH: &str = "artifacts/model.json";

/// Default explainer artifact path
pub const DEFAULT_EXPLAINER_PATH: &str = "artifacts/explainer.json";

/// Default reference sample path
pub const DEFAULT_REFERENCE_SAMPLE_PATH: &str = "artifacts/reference_sample.json";

/// Bars drawn in a waterfall, remainder bar included
pub const DEFAULT_WATERFALL_MAX_DISPLAY: usize = 12;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "hdb_price_core=debug,tower_http=debug";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "HDB Price Predictor";
