//! # Collectors Module
//!
//! Everything that talks to the media server during a run.
//!
//! - **`inventory`**: pipeline discovery and the pipeline-level setup wave
//! - **`endpoint`**: the concurrent per-endpoint query group
//! - **`monitor`**: orchestrates one run end to end

pub mod endpoint;
pub mod inventory;
pub mod monitor;

pub use endpoint::{
    CollectOptions,
    EndpointSnapshot,
    Protocol,
};
pub use inventory::Inventory;
pub use monitor::Monitor;
