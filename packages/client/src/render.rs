//! Terminal rendering.
//!
//! The renderer task turns [`ConversationEvent`]s into lines and queues them;
//! the [`TerminalView`] writes queued lines out when the scroll controller
//! decides it is time to scroll to the end.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use huddle_core::{
    ConversationSession,
    domain::{ConversationEvent, Message, ParticipantId, ParticipantRegistry, TypingStopReason},
    ui::{ScrollBehavior, ScrollController, ScrollRequester, Viewport},
};
use huddle_shared::time::timestamp_to_local_clock;
use tokio::{
    sync::{broadcast, oneshot},
    task::JoinHandle,
};

use crate::transcript::author_name;

/// Lines waiting for the next frame
#[derive(Debug, Clone, Default)]
pub struct LineBuffer(Arc<Mutex<Vec<String>>>);

impl LineBuffer {
    pub fn push(&self, line: String) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(line);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// The bottom of the terminal is the end of the transcript, so scrolling to
/// the end means writing out whatever is queued.
pub struct TerminalView<W> {
    lines: LineBuffer,
    out: W,
}

impl<W: Write + Send + 'static> TerminalView<W> {
    pub fn new(lines: LineBuffer, out: W) -> Self {
        Self { lines, out }
    }
}

impl<W: Write + Send + 'static> Viewport for TerminalView<W> {
    fn scroll_to_end(&mut self, behavior: ScrollBehavior) {
        let lines = self.lines.take();
        tracing::trace!("Flushing {} line(s) ({:?})", lines.len(), behavior);
        for line in lines {
            if let Err(e) = writeln!(self.out, "{line}") {
                tracing::warn!("Failed to write to terminal: {}", e);
                return;
            }
        }
        let _ = self.out.flush();
    }
}

/// `[14:05] 👩‍💼 Sarah Chen (Product Manager): text`
pub fn format_message(message: &Message, registry: &ParticipantRegistry) -> String {
    let clock = timestamp_to_local_clock(message.created_at.value());
    let name = author_name(message, registry);
    let who = match message
        .author
        .participant_id()
        .and_then(|id| registry.get(id))
    {
        Some(participant) => format!("{} {} ({})", participant.avatar, name, participant.role),
        None => name,
    };
    let marker = if message.failure.is_some() { " [!]" } else { "" };
    format!("[{clock}] {who}{marker}: {}", message.body)
}

/// `None` when nobody is typing.
pub fn format_typing(names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [one] => Some(format!("  {one} is typing…")),
        [first, second] => Some(format!("  {first} and {second} are typing…")),
        many => Some(format!("  {} people are typing…", many.len())),
    }
}

/// Handle to the renderer task.
pub struct Renderer {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Renderer {
    /// Render every event published so far, then stop.
    pub async fn finish(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await
            && e.is_panic()
        {
            tracing::error!("Renderer task panicked: {}", e);
        }
    }
}

struct RenderState {
    registry: ParticipantRegistry,
    lines: LineBuffer,
    scroll: ScrollRequester,
    typing: Vec<ParticipantId>,
}

impl RenderState {
    fn render(&mut self, event: ConversationEvent) {
        match event {
            ConversationEvent::MessageAppended(message) => {
                self.lines.push(format_message(&message, &self.registry));
            }
            ConversationEvent::TypingStarted { participant } => {
                self.typing.push(participant);
                let names: Vec<_> = self
                    .typing
                    .iter()
                    .map(|id| {
                        self.registry
                            .get(id)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| id.to_string())
                    })
                    .collect();
                if let Some(line) = format_typing(&names) {
                    self.lines.push(line);
                    self.scroll.request(ScrollBehavior::Smooth);
                }
            }
            ConversationEvent::TypingStopped {
                participant,
                reason,
            } => {
                self.typing.retain(|id| *id != participant);
                if reason == TypingStopReason::Expired {
                    tracing::debug!("'{}' stopped typing without replying", participant);
                }
            }
            ConversationEvent::StatusChanged { id, from, to } => {
                tracing::trace!("Message {} {:?} -> {:?}", id, from, to);
            }
            ConversationEvent::ConversationReset { .. } => {
                self.typing.clear();
                self.lines.push("── conversation reset ──".to_string());
            }
        }
    }

    fn drain(&mut self, events: &mut broadcast::Receiver<ConversationEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.render(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Renderer skipped {} event(s)", skipped);
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => break,
            }
        }
    }
}

/// Render conversation events into `lines` until the bus closes or
/// [`Renderer::finish`] is called.
pub fn spawn_renderer(
    mut events: broadcast::Receiver<ConversationEvent>,
    registry: ParticipantRegistry,
    lines: LineBuffer,
    scroll: ScrollRequester,
) -> Renderer {
    let (stop, mut stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let mut state = RenderState {
            registry,
            lines,
            scroll,
            typing: Vec::new(),
        };
        loop {
            tokio::select! {
                biased;
                received = events.recv() => match received {
                    Ok(event) => state.render(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Renderer skipped {} event(s)", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = &mut stopped => {
                    state.drain(&mut events);
                    break;
                }
            }
        }
    });
    Renderer { stop, task }
}

/// Renderer and scroll controller writing one session to `out`.
pub struct Frontend {
    scroll: ScrollController,
    renderer: Renderer,
}

impl Frontend {
    pub fn attach<W: Write + Send + 'static>(session: &ConversationSession, out: W) -> Self {
        let lines = LineBuffer::default();
        let mut scroll = ScrollController::new(TerminalView::new(lines.clone(), out));
        scroll.follow(session.subscribe());
        let renderer = spawn_renderer(
            session.subscribe(),
            session.registry().clone(),
            lines,
            scroll.requester(),
        );
        Self { scroll, renderer }
    }

    /// Render and write out everything published so far, then stop.
    pub async fn shutdown(self) {
        self.renderer.finish().await;
        self.scroll.shutdown().await;
    }
}
