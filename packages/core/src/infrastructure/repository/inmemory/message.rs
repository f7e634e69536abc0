//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! ドメインモデル `MessageLog` を Mutex で包み、変更ごとに
//! `ConversationEvent` をブロードキャストします。
//!
//! 各変更は 1 回のロック取得の中で完結するため、複数の参加者のパイプラインが
//! 交互に書き込んでも互いのフィールドを壊すことはありません。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use crate::domain::{
    ConversationEvent, Epoch, Message, MessageId, MessageLog, MessageRepository, MessageStatus,
    NewMessage,
};

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    /// 会話ログ（ドメインモデル）
    log: Arc<Mutex<MessageLog>>,
    /// 変更通知チャンネル
    events: broadcast::Sender<ConversationEvent>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成
    pub fn new(events: broadcast::Sender<ConversationEvent>) -> Self {
        Self {
            log: Arc::new(Mutex::new(MessageLog::new())),
            events,
        }
    }

    fn publish_appended(&self, message: &Message) {
        // 受信者がいない場合の送信エラーは無視してよい
        let _ = self
            .events
            .send(ConversationEvent::MessageAppended(message.clone()));
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, draft: NewMessage) -> MessageId {
        let mut log = self.log.lock().await;
        let message = log.append(draft);
        self.publish_appended(message);
        message.id
    }

    async fn append_in(&self, epoch: Epoch, draft: NewMessage) -> Option<MessageId> {
        let mut log = self.log.lock().await;
        let current = log.epoch();
        match log.append_in(epoch, draft) {
            Some(message) => {
                self.publish_appended(message);
                Some(message.id)
            }
            None => {
                tracing::debug!("Dropping append from stale epoch {epoch} (current {current})");
                None
            }
        }
    }

    async fn update_status(&self, id: MessageId, status: MessageStatus) -> bool {
        let mut log = self.log.lock().await;
        match log.update_status(id, status) {
            Ok(from) => {
                let _ = self.events.send(ConversationEvent::StatusChanged {
                    id,
                    from,
                    to: status,
                });
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring status update: {}", e);
                false
            }
        }
    }

    async fn get(&self, id: MessageId) -> Option<Message> {
        let log = self.log.lock().await;
        log.get(id).cloned()
    }

    async fn all(&self) -> Vec<Message> {
        let log = self.log.lock().await;
        log.messages().to_vec()
    }

    async fn len(&self) -> usize {
        let log = self.log.lock().await;
        log.len()
    }

    async fn epoch(&self) -> Epoch {
        let log = self.log.lock().await;
        log.epoch()
    }

    async fn reset(&self) -> Epoch {
        let mut log = self.log.lock().await;
        let epoch = log.reset();
        let _ = self
            .events
            .send(ConversationEvent::ConversationReset { epoch });
        epoch
    }
}
