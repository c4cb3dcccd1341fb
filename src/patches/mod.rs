//! Built-in patches.
//!
//! Each patch is a ready-to-use `Processor` covering one way of driving the
//! six rows: audio-rate buffered processing, control-rate light animation,
//! input routing, and knob write-back.
//!
//! # Example
//!
//! ```
//! use saavy_proto::{patches, processor::Processor};
//!
//! let vco = patches::by_name("vco").expect("built in");
//! assert_eq!(vco.name(), "vco");
//! assert!(patches::by_name("missing").is_none());
//! ```

pub mod factorial_router;
pub mod gain;
pub mod rainbow;
pub mod sandbox;
pub mod vco;

pub use factorial_router::FactorialRouter;
pub use gain::Gain;
pub use rainbow::Rainbow;
pub use sandbox::Sandbox;
pub use vco::Vco;

use crate::processor::Processor;

/// Names accepted by `by_name`
pub const NAMES: &[&str] = &["gain", "vco", "rainbow", "factorial_router", "sandbox"];

/// Look up a built-in patch
pub fn by_name(name: &str) -> Option<Box<dyn Processor>> {
    let patch: Box<dyn Processor> = match name {
        "gain" => Box::new(Gain::new()),
        "vco" => Box::new(Vco::new()),
        "rainbow" => Box::new(Rainbow::new()),
        "factorial_router" => Box::new(FactorialRouter::new()),
        "sandbox" => Box::new(Sandbox::new()),
        _ => return None,
    };
    Some(patch)
}
