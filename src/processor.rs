//! The callback a dispatcher drives once per block.

use crate::{
    block::Block,
    config::DispatchConfig,
    error::ProcessResult,
};

/// Core trait for per-block callbacks
///
/// Runs on the realtime thread: no locks, no blocking I/O, and ideally no
/// allocation inside `process`.
pub trait Processor: Send {
    /// Process one block in place.
    ///
    /// Returning an error (or panicking) silences this block's outputs; the
    /// next block is dispatched normally.
    fn process(&mut self, block: &mut Block) -> ProcessResult;

    /// Configuration this processor wants when it is loaded
    fn config(&self) -> DispatchConfig {
        DispatchConfig::default()
    }

    fn name(&self) -> &str {
        "processor"
    }
}

/// Allow boxed processors to be used as processors (for dynamic dispatch)
impl Processor for Box<dyn Processor> {
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        (**self).process(block)
    }

    fn config(&self) -> DispatchConfig {
        (**self).config()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Closure-backed processor
pub struct FnProcessor<F> {
    f: F,
    config: DispatchConfig,
}

/// Wrap a closure as a processor with the default configuration.
///
/// # Example
/// ```
/// use saavy_proto::processor::{from_fn, Processor};
///
/// let invert = from_fn(|block| {
///     let x = block.input(0);
///     block.set_output(0, -x);
///     Ok(())
/// });
/// assert_eq!(invert.config().buffer_size, 1);
/// ```
pub fn from_fn<F>(f: F) -> FnProcessor<F>
where
    F: FnMut(&mut Block) -> ProcessResult + Send,
{
    FnProcessor {
        f,
        config: DispatchConfig::default(),
    }
}

impl<F> FnProcessor<F> {
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: FnMut(&mut Block) -> ProcessResult + Send,
{
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        (self.f)(block)
    }

    fn config(&self) -> DispatchConfig {
        self.config
    }

    fn name(&self) -> &str {
        "closure"
    }
}
