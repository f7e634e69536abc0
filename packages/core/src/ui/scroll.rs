//! Transcript follow / scroll controller.
//!
//! Keeps the transcript pinned to its newest entry. Requests are coalesced:
//! however many arrive within one frame, the viewport is scrolled once, on the
//! next frame boundary, after the new content has been laid out.

use std::time::Duration;

use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::sleep,
};

use crate::domain::ConversationEvent;

/// One display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

impl ScrollBehavior {
    /// `Instant` wins when both kinds are pending.
    fn merge(self, other: ScrollBehavior) -> ScrollBehavior {
        match (self, other) {
            (ScrollBehavior::Smooth, ScrollBehavior::Smooth) => ScrollBehavior::Smooth,
            _ => ScrollBehavior::Instant,
        }
    }
}

/// Whatever displays the transcript.
pub trait Viewport: Send + 'static {
    fn scroll_to_end(&mut self, behavior: ScrollBehavior);
}

/// Cloneable handle that can only ask for scrolls.
#[derive(Debug, Clone)]
pub struct ScrollRequester(mpsc::UnboundedSender<ScrollBehavior>);

impl ScrollRequester {
    pub fn request(&self, behavior: ScrollBehavior) {
        let _ = self.0.send(behavior);
    }
}

pub struct ScrollController {
    requests: mpsc::UnboundedSender<ScrollBehavior>,
    frame: JoinHandle<()>,
    followers: Vec<JoinHandle<()>>,
}

impl ScrollController {
    pub fn new(viewport: impl Viewport) -> Self {
        Self::with_frame_interval(viewport, DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(viewport: impl Viewport, frame_interval: Duration) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let frame = tokio::spawn(run_frames(viewport, rx, frame_interval));
        Self {
            requests,
            frame,
            followers: Vec::new(),
        }
    }

    /// Ask for a scroll to the newest entry on the next frame.
    pub fn request(&self, behavior: ScrollBehavior) {
        // Only fails once the frame task is gone, i.e. during shutdown.
        let _ = self.requests.send(behavior);
    }

    /// Handle for producers that run on their own task, e.g. a renderer that
    /// has just queued a typing line. Drop it before [`Self::shutdown`].
    pub fn requester(&self) -> ScrollRequester {
        ScrollRequester(self.requests.clone())
    }

    /// Scroll to the end whenever a message is appended or the conversation
    /// is reset.
    pub fn follow(&mut self, mut events: broadcast::Receiver<ConversationEvent>) {
        let requests = self.requests.clone();
        let follower = tokio::spawn(async move {
            loop {
                let behavior = match events.recv().await {
                    Ok(ConversationEvent::MessageAppended(_))
                    | Ok(ConversationEvent::ConversationReset { .. }) => ScrollBehavior::Instant,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Scroll follower lagged by {} event(s)", skipped);
                        ScrollBehavior::Instant
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if requests.send(behavior).is_err() {
                    break;
                }
            }
        });
        self.followers.push(follower);
    }

    /// Stop following, scroll to the end one last time and wait for the frame
    /// task. Anything queued for the viewport before this call is shown.
    pub async fn shutdown(self) {
        for follower in &self.followers {
            follower.abort();
        }
        drop(self.followers);
        let _ = self.requests.send(ScrollBehavior::Instant);
        drop(self.requests);
        if let Err(e) = self.frame.await
            && e.is_panic()
        {
            tracing::error!("Scroll frame task panicked: {}", e);
        }
    }
}

async fn run_frames(
    mut viewport: impl Viewport,
    mut requests: mpsc::UnboundedReceiver<ScrollBehavior>,
    frame_interval: Duration,
) {
    while let Some(first) = requests.recv().await {
        sleep(frame_interval).await;
        let mut pending = first;
        while let Ok(next) = requests.try_recv() {
            pending = pending.merge(next);
        }
        viewport.scroll_to_end(pending);
    }
}
