pub mod block; // Per-cycle view handed to processors
pub mod config;
pub mod diagnostics; // Realtime-safe side channel
pub mod dispatch;
pub mod error;
pub mod patches; // Built-in processors
pub mod processor;

pub use block::{Block, Frame, Panel, Rgb};
pub use config::{DispatchConfig, UnderrunPolicy};
pub use dispatch::{DispatchState, DispatchStats, Dispatcher};
pub use error::{ConfigurationError, ProcessError, ProcessResult};
pub use processor::Processor;

/// Rows on the panel: inputs, outputs, knobs, switches, lights
pub const NUM_CHANNELS: usize = 6;
pub const MAX_BUFFER_SIZE: usize = 4096;
