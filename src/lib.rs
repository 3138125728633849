//! tgscout: Telegram group and channel discovery.
//!
//! The search itself lives in the `tgscout-search` crate. This crate is the
//! thin host around it:
//!
//! - **Configuration**: one TOML file with `[search]`, `[gateway]` and
//!   `[render]` sections
//! - **Rendering**: results as plain-text messages sized for chat transports
//! - **Gateway**: an `axum` HTTP front end (`/health`, `/search`, `/last`)
//!
//! The `tgscout` binary wires these together as a CLI.

pub mod config;
pub mod error;
pub mod gateway;
pub mod render;

pub use config::{AppConfig, GatewayConfig, RenderConfig};
pub use error::{AppError, Result};
pub use gateway::Gateway;
pub use tgscout_search::{GroupSearch, Record, SearchConfig, SearchError, SearchResult};
