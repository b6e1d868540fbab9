//! # Events Module
//!
//! Progress reporting that does not depend on any particular front end.
//!
//! ## Design
//! The library emits events through a channel. The CLI subscribes to drive
//! its spinner; a GUI or a test can subscribe the same way.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Replicate(ReplicateEvent::Progress(p)) = event {
//!             println!("{}", p);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
