//! Realtime-safe diagnostics channel.
//!
//! Everything the audio thread wants to tell the outside world (display text,
//! caught faults, underruns, applied configs) is a `Copy` value pushed into a
//! bounded `rtrb` ring. The producer never blocks: when the ring is full the
//! newest diagnostic is dropped and counted.

use std::fmt::{self, Write as _};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{config::DispatchConfig, error::ConfigurationError};

/// Byte capacity of a display message
pub const DISPLAY_CAPACITY: usize = 256;

/// Fixed-capacity UTF-8 text, truncated on a char boundary.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DisplayText {
    bytes: [u8; DISPLAY_CAPACITY],
    len: usize,
}

impl DisplayText {
    pub const fn new() -> Self {
        Self {
            bytes: [0; DISPLAY_CAPACITY],
            len: 0,
        }
    }

    /// Build from anything printable, truncating to `DISPLAY_CAPACITY`
    pub fn from_display(value: impl fmt::Display) -> Self {
        let mut text = Self::new();
        // Truncation is silent; the writer never reports an error.
        let _ = write!(text, "{value}");
        text
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for DisplayText {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for DisplayText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = DISPLAY_CAPACITY - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

impl fmt::Debug for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages from the dispatch thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diagnostic {
    /// Text the processor passed to `display()` during a cycle
    Display { cycle: u64, text: DisplayText },
    /// The processor returned an error or panicked; outputs were silenced
    CallbackFault { cycle: u64, message: DisplayText },
    /// Input frames stopped arriving at the given tick
    Underrun { tick: u64 },
    /// A staged or requested configuration took effect at a block boundary
    ConfigApplied(DispatchConfig),
    /// A configuration requested from inside the callback was invalid
    ConfigRejected(ConfigurationError),
}

/// Create a diagnostics channel with room for `capacity` messages
pub fn channel(capacity: usize) -> (DiagnosticSender, Diagnostics) {
    let (tx, rx) = RingBuffer::new(capacity);
    (
        DiagnosticSender { tx, dropped: 0 },
        Diagnostics {
            rx,
            last_message: DisplayText::new(),
        },
    )
}

/// Producer half, owned by the dispatcher.
pub struct DiagnosticSender {
    tx: Producer<Diagnostic>,
    dropped: u64,
}

impl DiagnosticSender {
    /// Push without blocking. Returns false if the message was dropped.
    pub fn send(&mut self, diagnostic: Diagnostic) -> bool {
        match self.tx.push(diagnostic) {
            Ok(()) => true,
            Err(_) => {
                self.dropped += 1;
                false
            }
        }
    }

    /// Messages lost to a full ring so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consumer half, polled from a non-realtime thread.
pub struct Diagnostics {
    rx: Consumer<Diagnostic>,
    last_message: DisplayText,
}

impl Diagnostics {
    pub fn poll(&mut self) -> Option<Diagnostic> {
        let diagnostic = self.rx.pop().ok()?;
        match diagnostic {
            Diagnostic::Display { text, .. } => self.last_message = text,
            Diagnostic::CallbackFault { message, .. } => self.last_message = message,
            _ => {}
        }
        Some(diagnostic)
    }

    /// Drain the ring, logging each entry. Returns how many were drained.
    pub fn drain_logged(&mut self) -> usize {
        let mut count = 0;
        while let Some(diagnostic) = self.poll() {
            count += 1;
            match diagnostic {
                Diagnostic::Display { cycle, text } => {
                    log::trace!("cycle {cycle}: {text}");
                }
                Diagnostic::CallbackFault { cycle, message } => {
                    log::warn!("process() failed in cycle {cycle}: {message}");
                }
                Diagnostic::Underrun { tick } => {
                    log::warn!("input underrun at tick {tick}");
                }
                Diagnostic::ConfigApplied(config) => {
                    log::info!(
                        "applied frame divider {} buffer size {}",
                        config.frame_divider,
                        config.buffer_size
                    );
                }
                Diagnostic::ConfigRejected(err) => {
                    log::error!("processor requested invalid config: {err}");
                }
            }
        }
        count
    }

    /// The most recent display text or fault message seen by `poll`
    pub fn last_message(&self) -> &str {
        self.last_message.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_truncates_on_char_boundary() {
        // 'é' is two bytes; 129 of them cannot fit in 256 bytes exactly
        let long: String = std::iter::repeat('é').take(129).collect();
        let text = DisplayText::from_display(&long);
        assert_eq!(text.len(), DISPLAY_CAPACITY);
        assert_eq!(text.as_str().chars().count(), 128);

        let odd: String = std::iter::once('a')
            .chain(std::iter::repeat('é').take(200))
            .collect();
        let text = DisplayText::from_display(&odd);
        assert_eq!(text.len(), DISPLAY_CAPACITY - 1);
        assert!(text.as_str().starts_with('a'));
    }

    #[test]
    fn display_text_formats() {
        let text = DisplayText::from_display(format_args!("Freq: {:.3} Hz", 440.0));
        assert_eq!(text.as_str(), "Freq: 440.000 Hz");
        assert_eq!(format!("{text:?}"), "\"Freq: 440.000 Hz\"");
    }

    #[test]
    fn full_ring_drops_newest() {
        let (mut tx, mut rx) = channel(2);
        assert!(tx.send(Diagnostic::Underrun { tick: 1 }));
        assert!(tx.send(Diagnostic::Underrun { tick: 2 }));
        assert!(!tx.send(Diagnostic::Underrun { tick: 3 }));
        assert_eq!(tx.dropped(), 1);

        assert_eq!(rx.poll(), Some(Diagnostic::Underrun { tick: 1 }));
        assert_eq!(rx.poll(), Some(Diagnostic::Underrun { tick: 2 }));
        assert_eq!(rx.poll(), None);
    }

    #[test]
    fn last_message_tracks_display_and_faults() {
        let (mut tx, mut rx) = channel(8);
        tx.send(Diagnostic::Display {
            cycle: 0,
            text: DisplayText::from_display("hello"),
        });
        tx.send(Diagnostic::Underrun { tick: 10 });
        assert_eq!(rx.drain_logged(), 2);
        assert_eq!(rx.last_message(), "hello");

        tx.send(Diagnostic::CallbackFault {
            cycle: 1,
            message: DisplayText::from_display("boom"),
        });
        rx.drain_logged();
        assert_eq!(rx.last_message(), "boom");
    }
}
