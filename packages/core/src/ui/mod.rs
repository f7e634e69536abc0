//! Presentation helpers shared by every front end.

pub mod scroll;

pub use scroll::{
    DEFAULT_FRAME_INTERVAL, ScrollBehavior, ScrollController, ScrollRequester, Viewport,
};
