//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::ValueObjectError;

/// メッセージ送信が受け付けられなかった理由
///
/// どの場合も会話の状態は変更されない。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("message cannot exceed {max} characters (got {actual})")]
    MessageTooLong { max: usize, actual: usize },

    #[error("no participant is selected")]
    NoActiveParticipants,

    #[error("conversation was reset while sending")]
    ConversationReset,
}

impl From<ValueObjectError> for SendMessageError {
    fn from(err: ValueObjectError) -> Self {
        match err {
            ValueObjectError::MessageBodyTooLong { max, actual } => {
                SendMessageError::MessageTooLong { max, actual }
            }
            _ => SendMessageError::EmptyMessage,
        }
    }
}
