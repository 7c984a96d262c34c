//! Event sinks
//!
//! A sink receives decoded events in emission order and presents or
//! persists them. Sinks never see decoder internals; a failing sink is
//! reported to the session and does not affect decoding.
//!
//! - `ConsoleSink`: labelled lines on any `Write` (stdout by default)
//! - `FileSink`: rotating CSV / JSON-lines record files on a writer thread
//! - `Vec<Event>`: collects events in memory

pub mod console;
pub mod file;
pub mod record;

pub use console::ConsoleSink;
pub use file::{FileSink, FileSinkConfig};
pub use record::RecordFormat;

use crate::codec::Event;
use crate::error::Result;

/// Consumer of decoded events
pub trait EventSink: Send {
    /// Accept one event
    ///
    /// Must not reorder events. A sink that sheds load under backpressure
    /// returns `Ok` and counts the event in `dropped()`.
    fn send(&mut self, event: &Event) -> Result<()>;

    /// Push buffered records to their destination
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Flush and release resources; no events are accepted afterwards
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    /// Events discarded because the sink could not keep up
    fn dropped(&self) -> u64 {
        0
    }
}

impl EventSink for Vec<Event> {
    fn send(&mut self, event: &Event) -> Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn send(&mut self, event: &Event) -> Result<()> {
        (**self).send(event)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn dropped(&self) -> u64 {
        (**self).dropped()
    }
}
