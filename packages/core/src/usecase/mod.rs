//! UseCase 層
//!
//! 会話のオーケストレーションを実装するレイヤー。
//! Session から呼び出され、Domain 層と Infrastructure 層を操作します。

pub mod error;
pub mod pacing;
pub mod send_message;

pub use error::SendMessageError;
pub use pacing::{FixedPacing, PacingConfig, PacingPolicy, RandomPacing};
pub use send_message::{Dispatch, SendMessageUseCase};
