use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

use crate::shared::image_message::ImageMessage;
use crate::transport::domain::frame_publisher::FramePublisher;
use crate::transport::domain::frame_source::FrameSource;

/// What a publisher does when the topic queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait for the subscriber to make room.
    #[default]
    Block,
    /// Discard the oldest queued message, then enqueue.
    DropOldest,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic {0} has no subscriber")]
    Disconnected(String),
    #[error("publisher on topic {0} is closed")]
    Closed(String),
}

/// Creates a bounded in-process topic. A capacity of 0 is raised to 1.
pub fn topic(
    name: &str,
    capacity: usize,
    policy: OverflowPolicy,
) -> (TopicPublisher, TopicSubscriber) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
    let drain = match policy {
        OverflowPolicy::DropOldest => Some(receiver.clone()),
        OverflowPolicy::Block => None,
    };
    let publisher = TopicPublisher {
        name: name.to_string(),
        sender: Some(sender),
        drain,
        dropped: Arc::new(AtomicUsize::new(0)),
    };
    let subscriber = TopicSubscriber {
        name: name.to_string(),
        receiver: Some(receiver),
    };
    (publisher, subscriber)
}

pub struct TopicPublisher {
    name: String,
    sender: Option<Sender<ImageMessage>>,
    /// Publisher-side handle used to evict under `DropOldest`.
    drain: Option<Receiver<ImageMessage>>,
    dropped: Arc<AtomicUsize>,
}

impl TopicPublisher {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Messages evicted so far under `DropOldest`.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, message: ImageMessage) -> Result<(), TopicError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| TopicError::Closed(self.name.clone()))?;

        let Some(drain) = &self.drain else {
            return sender
                .send(message)
                .map_err(|_| TopicError::Disconnected(self.name.clone()));
        };

        let mut pending = message;
        loop {
            match sender.try_send(pending) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => {
                    if let Ok(evicted) = drain.try_recv() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        log::debug!("{}: queue full, dropped message {}", self.name, evicted.seq);
                    }
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(TopicError::Disconnected(self.name.clone()));
                }
            }
        }
    }
}

impl FramePublisher for TopicPublisher {
    fn topic(&self) -> &str {
        &self.name
    }

    fn publish(&mut self, message: &ImageMessage) -> Result<(), Box<dyn std::error::Error>> {
        self.send(message.clone())?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.sender = None;
        Ok(())
    }
}

pub struct TopicSubscriber {
    name: String,
    receiver: Option<Receiver<ImageMessage>>,
}

impl FrameSource for TopicSubscriber {
    fn topic(&self) -> &str {
        &self.name
    }

    fn messages(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<ImageMessage, Box<dyn std::error::Error>>> + '_> {
        match &self.receiver {
            Some(receiver) => Box::new(receiver.iter().map(Ok)),
            None => Box::new(std::iter::empty()),
        }
    }

    fn close(&mut self) {
        self.receiver = None;
    }
}
