//! Event channel built on crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half, cloned into every stage that reports progress.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event. A dropped receiver is not an error: nobody is listening.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half, held by whichever front end renders progress.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event arrives, `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for event channels.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel. Events are small and a slow listener must never
    /// stall the copy workers.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// A sender whose receiver is already gone, for runs nobody watches.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ManifestEvent, ManifestProgress, PipelineEvent};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_cross_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Manifest(ManifestEvent::Progress(ManifestProgress {
                inspected: 3,
                total: 10,
                current_path: PathBuf::from("/photos/IMG_0003.JPG"),
            })));
        });
        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Manifest(ManifestEvent::Progress(p)) => assert_eq!(p.inspected, 3),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn receiver_sees_end_of_stream() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        drop(sender);

        assert!(receiver.recv().is_some());
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn null_sender_does_not_panic() {
        null_sender().send(Event::Pipeline(PipelineEvent::Started));
    }
}
