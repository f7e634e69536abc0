//! UseCase: メッセージ送信とレスポンスのディスパッチ
//!
//! 1 回のユーザー送信を、有効な参加者それぞれへの独立したパイプラインに
//! 分配します。
//!
//! ```text
//! send("Hello team")
//!   ├─ user message (sending) ──► sent ──► delivered ──► read
//!   ├─ [0] stagger ─ typing ─ gateway ─ typing wait ─ reply (delivered) ─ read
//!   └─ [1] stagger ─ typing ─ gateway ─ fallback (delivered)
//! ```
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() の受付判定（空文字・参加者なし）
//! - 参加者ごとの返信・フォールバック・入力中表示のライフサイクル
//!
//! ### なぜこのテストが必要か
//! - 1 人の参加者の失敗や遅延が他の参加者やユーザーのメッセージに影響しないことを保証
//! - 会話リセット後の遅延レスポンスが新しい会話に混入しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人への送信と返信
//! - 異常系：404 / 通信エラー / 空の返信
//! - エッジケース：応答待ち中のリセット

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::{
    task::JoinHandle,
    time::{Instant, sleep},
};

use crate::{
    domain::{
        ActiveParticipants, ChatFailure, ChatGateway, ChatRequest, Epoch, MessageBody, MessageId,
        MessageRepository, MessageStatus, NewMessage, ParticipantId, Timestamp, UserContext,
    },
    infrastructure::TypingTracker,
};

use super::{error::SendMessageError, pacing::PacingPolicy};

/// メッセージ送信のユースケース（Response Dispatcher）
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    /// 入力中表示
    typing: Arc<TypingTracker>,
    /// 外部チャット API
    gateway: Arc<dyn ChatGateway>,
    /// 遅延の生成
    pacing: Arc<dyn PacingPolicy>,
}

/// Epochs captured when the send was accepted
#[derive(Debug, Clone, Copy)]
struct Scope {
    messages: Epoch,
    typing: Epoch,
}

/// Everything one participant pipeline needs, owned so it can be spawned
struct Pipeline {
    repository: Arc<dyn MessageRepository>,
    typing: Arc<TypingTracker>,
    gateway: Arc<dyn ChatGateway>,
    pacing: Arc<dyn PacingPolicy>,
    scope: Scope,
    user_message_id: MessageId,
    text: String,
    user_context: UserContext,
}

/// Handle on the work spawned by one send
pub struct Dispatch {
    user_message_id: MessageId,
    acknowledgement: JoinHandle<()>,
    pipelines: Vec<(ParticipantId, JoinHandle<()>)>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        typing: Arc<TypingTracker>,
        gateway: Arc<dyn ChatGateway>,
        pacing: Arc<dyn PacingPolicy>,
    ) -> Self {
        Self {
            repository,
            typing,
            gateway,
            pacing,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `text` - ユーザーの入力（前後の空白は除去される）
    /// * `active` - 返信する参加者（この順序でずらして応答する）
    /// * `user_context` - API に渡すユーザー情報
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatch)` - ユーザーメッセージは追加済み、各パイプラインは起動済み
    /// * `Err(SendMessageError)` - 受付拒否（状態は変更されない）
    pub async fn execute(
        &self,
        text: &str,
        active: &ActiveParticipants,
        user_context: &UserContext,
    ) -> Result<Dispatch, SendMessageError> {
        // 1. 受付判定
        let body = MessageBody::new(text)?;
        if active.is_empty() {
            return Err(SendMessageError::NoActiveParticipants);
        }

        // 2. 楽観的にユーザーメッセージを追加
        // Both epochs must come from the same side of a reset; the session
        // holds resets off until this returns.
        let scope = Scope {
            messages: self.repository.epoch().await,
            typing: self.typing.epoch().await,
        };
        let user_message_id = self
            .repository
            .append_in(
                scope.messages,
                NewMessage::from_user(body.clone(), Timestamp::now()),
            )
            .await
            .ok_or(SendMessageError::ConversationReset)?;

        tracing::info!(
            "User message {} accepted, dispatching to {} participant(s)",
            user_message_id,
            active.len()
        );

        let acknowledgement = tokio::spawn(acknowledge(
            Arc::clone(&self.repository),
            Arc::clone(&self.pacing),
            user_message_id,
        ));

        // 3. 参加者ごとのパイプラインを起動
        let pipelines = active
            .ids()
            .iter()
            .enumerate()
            .map(|(index, participant)| {
                let pipeline = Pipeline {
                    repository: Arc::clone(&self.repository),
                    typing: Arc::clone(&self.typing),
                    gateway: Arc::clone(&self.gateway),
                    pacing: Arc::clone(&self.pacing),
                    scope,
                    user_message_id,
                    text: body.as_str().to_string(),
                    user_context: user_context.clone(),
                };
                let handle = tokio::spawn(pipeline.run(index, participant.clone()));
                (participant.clone(), handle)
            })
            .collect();

        Ok(Dispatch {
            user_message_id,
            acknowledgement,
            pipelines,
        })
    }
}

/// `sending -> sent -> delivered` on fixed local delays. Best-effort: a
/// refused transition (e.g. already `read`) is simply skipped.
async fn acknowledge(
    repository: Arc<dyn MessageRepository>,
    pacing: Arc<dyn PacingPolicy>,
    id: MessageId,
) {
    sleep(pacing.sent_delay()).await;
    repository.update_status(id, MessageStatus::Sent).await;
    sleep(pacing.delivered_delay()).await;
    repository.update_status(id, MessageStatus::Delivered).await;
}

impl Pipeline {
    async fn run(self, index: usize, participant: ParticipantId) {
        sleep(self.pacing.dispatch_delay(index)).await;

        // リセット済みなら API を呼ばない
        let started = self
            .typing
            .set_typing_in(
                self.scope.typing,
                participant.clone(),
                self.pacing.typing_timeout(),
            )
            .await;
        if !started {
            tracing::debug!(
                "Skipping dispatch to '{}': conversation was reset",
                participant
            );
            return;
        }
        let typing_began = Instant::now();
        tracing::debug!("Dispatching message {} to '{}'", self.user_message_id, participant);

        let request = ChatRequest {
            message: self.text.clone(),
            participant_id: participant.clone(),
            user_context: self.user_context.clone(),
        };
        let outcome = self.gateway.send(request).await.and_then(|reply| {
            MessageBody::truncated(&reply.text)
                .map(|body| (body, reply.display_name))
                .map_err(|_| ChatFailure::EmptyReply)
        });

        match outcome {
            Ok((body, display_name)) => {
                self.deliver_reply(participant, body, display_name, typing_began)
                    .await
            }
            Err(failure) => self.deliver_fallback(participant, failure).await,
        }
    }

    async fn deliver_reply(
        &self,
        participant: ParticipantId,
        body: MessageBody,
        display_name: Option<String>,
        typing_began: Instant,
    ) {
        // 自然な入力時間のうち、まだ経過していない分だけ待つ
        let natural = self.pacing.typing_duration(body.as_str());
        let remaining = natural.saturating_sub(typing_began.elapsed());
        sleep(remaining).await;

        self.typing
            .clear_typing_in(self.scope.typing, &participant)
            .await;
        let draft = NewMessage::reply(
            participant.clone(),
            body,
            self.user_message_id,
            Timestamp::now(),
        )
        .with_display_name(display_name);
        let Some(reply_id) = self.repository.append_in(self.scope.messages, draft).await else {
            tracing::debug!("Dropped late reply from '{}'", participant);
            return;
        };
        tracing::debug!("Reply {} from '{}' delivered", reply_id, participant);

        sleep(self.pacing.read_receipt_delay()).await;
        self.repository
            .update_status(self.user_message_id, MessageStatus::Read)
            .await;
        sleep(self.pacing.reply_seen_delay()).await;
        self.repository
            .update_status(reply_id, MessageStatus::Read)
            .await;
    }

    async fn deliver_fallback(&self, participant: ParticipantId, failure: ChatFailure) {
        tracing::warn!("Participant '{}' failed to reply: {}", participant, failure);

        self.typing
            .clear_typing_in(self.scope.typing, &participant)
            .await;
        let draft = NewMessage::fallback(
            participant.clone(),
            failure.kind(),
            self.user_message_id,
            Timestamp::now(),
        );
        if self
            .repository
            .append_in(self.scope.messages, draft)
            .await
            .is_none()
        {
            tracing::debug!("Dropped late fallback for '{}'", participant);
        }
    }
}

impl Dispatch {
    pub fn user_message_id(&self) -> MessageId {
        self.user_message_id
    }

    /// Participants addressed, in dispatch order.
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.pipelines.iter().map(|(participant, _)| participant)
    }

    pub fn is_finished(&self) -> bool {
        self.acknowledgement.is_finished()
            && self.pipelines.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Cancel every pipeline that has not finished yet.
    ///
    /// Typing indicators of aborted pipelines expire on their own timers.
    pub fn abort(&self) {
        self.acknowledgement.abort();
        for (_, handle) in &self.pipelines {
            handle.abort();
        }
    }

    /// Wait for the acknowledgement task and every participant pipeline.
    pub async fn join(self) {
        if let Err(e) = self.acknowledgement.await
            && e.is_panic()
        {
            tracing::error!("Acknowledgement task panicked: {}", e);
        }

        let (participants, handles): (Vec<_>, Vec<_>) = self.pipelines.into_iter().unzip();
        for (participant, result) in participants.iter().zip(join_all(handles).await) {
            if let Err(e) = result
                && e.is_panic()
            {
                tracing::error!("Pipeline for '{}' panicked: {}", participant, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Author, ChatReply, ConversationEvent, ConversationIdFactory, FailureKind, Message,
            ParticipantRegistry, TypingStopReason, gateway::MockChatGateway,
        },
        infrastructure::InMemoryMessageRepository,
        usecase::pacing::{FixedPacing, PacingConfig},
    };
    use std::time::Duration;
    use tokio::sync::broadcast;

    struct Fixture {
        repository: Arc<InMemoryMessageRepository>,
        typing: Arc<TypingTracker>,
        usecase: SendMessageUseCase,
        events: broadcast::Receiver<ConversationEvent>,
    }

    fn pacing_config() -> PacingConfig {
        PacingConfig {
            stagger_step_ms: 1_000,
            max_jitter_ms: 0,
            typing_timeout_ms: 30_000,
            typing_min_ms: 1_000,
            typing_max_ms: 3_000,
            typing_ms_per_char: 10,
            sent_delay_ms: 100,
            delivered_delay_ms: 200,
            read_receipt_delay_ms: 300,
            reply_seen_delay_ms: 400,
        }
    }

    fn create_fixture(gateway: impl ChatGateway + 'static) -> Fixture {
        let (tx, rx) = broadcast::channel(256);
        let repository = Arc::new(InMemoryMessageRepository::new(tx.clone()));
        let typing = Arc::new(TypingTracker::new(tx));
        let usecase = SendMessageUseCase::new(
            repository.clone(),
            typing.clone(),
            Arc::new(gateway),
            Arc::new(FixedPacing::new(pacing_config())),
        );
        Fixture {
            repository,
            typing,
            usecase,
            events: rx,
        }
    }

    fn active(ids: &[&str]) -> ActiveParticipants {
        ParticipantRegistry::with_defaults()
            .resolve_active(ids.iter().map(|id| ParticipantId::try_from(*id).unwrap()))
            .unwrap()
    }

    fn context() -> UserContext {
        UserContext::new(ConversationIdFactory::generate())
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::try_from(id).unwrap()
    }

    fn reply_from<'a>(messages: &'a [Message], participant: &str) -> Vec<&'a Message> {
        messages
            .iter()
            .filter(|m| m.author == Author::Participant(pid(participant)))
            .collect()
    }

    fn drain(rx: &mut broadcast::Receiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_without_state_change() {
        // テスト項目: 空文字・空白のみの送信は拒否され、ストアは変わらない
        // given (前提条件):
        let mut gateway = MockChatGateway::new();
        gateway.expect_send().never();
        let fixture = create_fixture(gateway);

        // when (操作):
        let empty = fixture.usecase.execute("", &active(&["sarah"]), &context()).await;
        let blank = fixture
            .usecase
            .execute("   \n\t", &active(&["sarah"]), &context())
            .await;

        // then (期待する結果):
        assert_eq!(empty.err(), Some(SendMessageError::EmptyMessage));
        assert_eq!(blank.err(), Some(SendMessageError::EmptyMessage));
        assert_eq!(fixture.repository.len().await, 0);
    }

    #[tokio::test]
    async fn test_no_active_participants_is_rejected_without_state_change() {
        // テスト項目: 参加者が選ばれていない場合は拒否され、ストアは変わらない
        let mut gateway = MockChatGateway::new();
        gateway.expect_send().never();
        let fixture = create_fixture(gateway);

        let result = fixture
            .usecase
            .execute("Hello team", &ActiveParticipants::default(), &context())
            .await;

        assert_eq!(result.err(), Some(SendMessageError::NoActiveParticipants));
        assert_eq!(fixture.repository.len().await, 0);
    }

    #[tokio::test]
    async fn test_too_long_text_is_rejected() {
        // テスト項目: 上限を超える本文は拒否される
        let fixture = create_fixture(MockChatGateway::new());

        let result = fixture
            .usecase
            .execute(&"a".repeat(10_001), &active(&["sarah"]), &context())
            .await;

        assert_eq!(
            result.err(),
            Some(SendMessageError::MessageTooLong {
                max: 10_000,
                actual: 10_001
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_to_two_participants() {
        // テスト項目: 2 人に送信すると、ユーザーメッセージ 1 件と返信 2 件が追加される
        // given (前提条件):
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .times(2)
            .returning(|request| Ok(ChatReply::new(format!("Hi from {}", request.participant_id))));
        let mut fixture = create_fixture(gateway);

        // when (操作):
        let dispatch = fixture
            .usecase
            .execute("Hello team", &active(&["sarah", "alex"]), &context())
            .await
            .unwrap();

        // then (期待する結果): 直後はユーザーメッセージのみ（sending）
        let immediately = fixture.repository.all().await;
        assert_eq!(immediately.len(), 1);
        assert_eq!(immediately[0].author, Author::User);
        assert_eq!(immediately[0].status, MessageStatus::Sending);
        assert_eq!(immediately[0].id, dispatch.user_message_id());

        dispatch.join().await;

        let messages = fixture.repository.all().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].author, Author::User);
        assert_eq!(messages[0].status, MessageStatus::Read);
        for participant in ["sarah", "alex"] {
            let replies = reply_from(&messages, participant);
            assert_eq!(replies.len(), 1);
            assert_eq!(replies[0].body.as_str(), format!("Hi from {participant}"));
            assert_eq!(replies[0].correlation_id, Some(messages[0].id));
            assert_eq!(replies[0].status, MessageStatus::Read);
        }

        // 返信は delivered で追加されている
        let appended: Vec<_> = drain(&mut fixture.events)
            .into_iter()
            .filter_map(|event| match event {
                ConversationEvent::MessageAppended(message) if !message.author.is_user() => {
                    Some(message.status)
                }
                _ => None,
            })
            .collect();
        assert_eq!(appended, vec![MessageStatus::Delivered; 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_pacing_orders_replies_by_position() {
        // テスト項目: ジッターなしでは位置順に返信が並ぶ
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .returning(|_| Ok(ChatReply::new("Sounds good")));
        let fixture = create_fixture(gateway);

        fixture
            .usecase
            .execute("Status?", &active(&["maya", "sarah", "alex"]), &context())
            .await
            .unwrap()
            .join()
            .await;

        let authors: Vec<_> = fixture
            .repository
            .all()
            .await
            .into_iter()
            .filter_map(|m| m.author.participant_id().cloned())
            .collect();
        assert_eq!(authors, vec![pid("maya"), pid("sarah"), pid("alex")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_participant_gets_fallback_and_others_continue() {
        // テスト項目: alex が 404 でも、alex のフォールバックが追加され sarah は通常通り返信する
        // given (前提条件):
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .withf(|request| request.participant_id.as_str() == "alex")
            .returning(|_| Err(ChatFailure::from_status(404, "no such agent")));
        gateway
            .expect_send()
            .withf(|request| request.participant_id.as_str() == "sarah")
            .returning(|_| Ok(ChatReply::new("On it!")));
        let fixture = create_fixture(gateway);

        // when (操作):
        fixture
            .usecase
            .execute("Hello team", &active(&["sarah", "alex"]), &context())
            .await
            .unwrap()
            .join()
            .await;

        // then (期待する結果):
        let messages = fixture.repository.all().await;
        let alex = reply_from(&messages, "alex");
        assert_eq!(alex.len(), 1);
        assert_eq!(
            alex[0].body.as_str(),
            FailureKind::ParticipantUnavailable.fallback_text()
        );
        assert_eq!(alex[0].status, MessageStatus::Delivered);
        assert_eq!(alex[0].failure, Some(FailureKind::ParticipantUnavailable));

        let sarah = reply_from(&messages, "sarah");
        assert_eq!(sarah.len(), 1);
        assert_eq!(sarah[0].body.as_str(), "On it!");
        assert_eq!(sarah[0].failure, None);

        assert!(!fixture.typing.is_typing(&pid("alex")).await);
        assert!(!fixture.typing.is_typing(&pid("sarah")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_categories_map_to_fallbacks() {
        // テスト項目: 失敗の種類ごとに対応するフォールバック文言が使われる
        let cases = [
            (ChatFailure::from_status(422, ""), FailureKind::InvalidFormat),
            (ChatFailure::from_status(500, ""), FailureKind::Backend),
            (ChatFailure::from_status(418, ""), FailureKind::Unknown),
            (
                ChatFailure::Transport("connection refused".to_string()),
                FailureKind::Transport,
            ),
        ];
        for (failure, kind) in cases {
            let mut gateway = MockChatGateway::new();
            gateway
                .expect_send()
                .returning(move |_| Err(failure.clone()));
            let fixture = create_fixture(gateway);

            fixture
                .usecase
                .execute("ping", &active(&["jordan"]), &context())
                .await
                .unwrap()
                .join()
                .await;

            let messages = fixture.repository.all().await;
            assert_eq!(messages[1].body.as_str(), kind.fallback_text());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_reply_becomes_unknown_fallback() {
        // テスト項目: 空の返信は Unknown のフォールバックになる
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .returning(|_| Ok(ChatReply::new("   ")));
        let fixture = create_fixture(gateway);

        fixture
            .usecase
            .execute("ping", &active(&["priya"]), &context())
            .await
            .unwrap()
            .join()
            .await;

        let messages = fixture.repository.all().await;
        assert_eq!(messages[1].failure, Some(FailureKind::Unknown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_waits_for_natural_typing_duration() {
        // テスト項目: API が即答しても、入力時間が経過するまで返信は追加されない
        // given (前提条件): 200 文字 → 2000ms の入力時間
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .returning(|_| Ok(ChatReply::new("a".repeat(200))));
        let fixture = create_fixture(gateway);

        // when (操作):
        let dispatch = fixture
            .usecase
            .execute("Tell me everything", &active(&["sarah"]), &context())
            .await
            .unwrap();

        // then (期待する結果):
        sleep(Duration::from_millis(1_900)).await;
        assert_eq!(fixture.repository.len().await, 1);
        assert!(fixture.typing.is_typing(&pid("sarah")).await);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fixture.repository.len().await, 2);
        assert!(!fixture.typing.is_typing(&pid("sarah")).await);

        dispatch.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_cleared_before_reply_appended() {
        // テスト項目: 入力中表示が消えてから返信が追加される
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .returning(|_| Ok(ChatReply::new("Done")));
        let mut fixture = create_fixture(gateway);

        fixture
            .usecase
            .execute("ping", &active(&["alex"]), &context())
            .await
            .unwrap()
            .join()
            .await;

        let events = drain(&mut fixture.events);
        let started = events.iter().position(|e| {
            *e == ConversationEvent::TypingStarted {
                participant: pid("alex"),
            }
        });
        let stopped = events.iter().position(|e| {
            *e == ConversationEvent::TypingStopped {
                participant: pid("alex"),
                reason: TypingStopReason::Cleared,
            }
        });
        let reply = events.iter().position(|e| {
            matches!(e, ConversationEvent::MessageAppended(m) if !m.author.is_user())
        });
        assert!(started.unwrap() < stopped.unwrap());
        assert!(stopped.unwrap() < reply.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_message_status_only_moves_forward() {
        // テスト項目: ユーザーメッセージのステータス遷移は前方向のみ
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .returning(|_| Ok(ChatReply::new("ok")));
        let mut fixture = create_fixture(gateway);

        let dispatch = fixture
            .usecase
            .execute("ping", &active(&["sarah", "alex"]), &context())
            .await
            .unwrap();
        let user_id = dispatch.user_message_id();
        dispatch.join().await;

        let rank = |status: MessageStatus| match status {
            MessageStatus::Sending => 0,
            MessageStatus::Sent => 1,
            MessageStatus::Delivered => 2,
            MessageStatus::Read => 3,
            MessageStatus::Failed => 4,
        };
        let transitions: Vec<_> = drain(&mut fixture.events)
            .into_iter()
            .filter_map(|event| match event {
                ConversationEvent::StatusChanged { id, from, to } if id == user_id => {
                    Some((from, to))
                }
                _ => None,
            })
            .collect();
        assert!(!transitions.is_empty());
        for (from, to) in &transitions {
            assert!(rank(*from) < rank(*to));
        }
        assert_eq!(transitions.last().unwrap().1, MessageStatus::Read);
    }

    struct SlowGateway {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl ChatGateway for SlowGateway {
        async fn send(&self, _request: ChatRequest) -> Result<ChatReply, ChatFailure> {
            sleep(self.delay).await;
            Ok(ChatReply::new("late answer"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_in_flight_drops_late_reply() {
        // テスト項目: 応答待ち中にリセットすると、遅れて届いた返信は新しい会話に現れない
        // given (前提条件):
        let fixture = create_fixture(SlowGateway {
            delay: Duration::from_secs(10),
        });
        let dispatch = fixture
            .usecase
            .execute("Hello team", &active(&["sarah"]), &context())
            .await
            .unwrap();
        sleep(Duration::from_secs(1)).await;
        assert!(fixture.typing.is_typing(&pid("sarah")).await);

        // when (操作):
        fixture.repository.reset().await;
        fixture.typing.reset().await;
        dispatch.join().await;

        // then (期待する結果):
        assert_eq!(fixture.repository.len().await, 0);
        assert!(!fixture.typing.is_typing(&pid("sarah")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_before_stagger_skips_gateway_call() {
        // テスト項目: ずらし待ち中にリセットされた参加者には API を呼ばない
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .withf(|request| request.participant_id.as_str() == "sarah")
            .times(1)
            .returning(|_| Ok(ChatReply::new("first")));
        gateway
            .expect_send()
            .withf(|request| request.participant_id.as_str() == "alex")
            .never();
        let fixture = create_fixture(gateway);

        let dispatch = fixture
            .usecase
            .execute("Hello team", &active(&["sarah", "alex"]), &context())
            .await
            .unwrap();
        sleep(Duration::from_millis(500)).await; // alex は t=1000ms に開始予定
        fixture.repository.reset().await;
        fixture.typing.reset().await;
        dispatch.join().await;

        assert_eq!(fixture.repository.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_timeout_does_not_drop_slow_reply() {
        // テスト項目: 入力中表示が先にタイムアウトしても、遅れた返信は追加される
        // given (前提条件): タイムアウト 30 秒、API は 45 秒かかる
        let mut fixture = create_fixture(SlowGateway {
            delay: Duration::from_secs(45),
        });

        // when (操作):
        let dispatch = fixture
            .usecase
            .execute("Anyone there?", &active(&["maya"]), &context())
            .await
            .unwrap();
        sleep(Duration::from_secs(31)).await;
        assert!(!fixture.typing.is_typing(&pid("maya")).await);
        dispatch.join().await;

        // then (期待する結果):
        let messages = fixture.repository.all().await;
        assert_eq!(reply_from(&messages, "maya").len(), 1);
        assert!(drain(&mut fixture.events).contains(&ConversationEvent::TypingStopped {
            participant: pid("maya"),
            reason: TypingStopReason::Expired,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_carries_text_participant_and_context() {
        // テスト項目: API リクエストに本文・参加者 ID・ユーザー情報が含まれる
        let conversation = context().with_user(Some("Jamie".to_string()), None);
        let expected = conversation.clone();
        let mut gateway = MockChatGateway::new();
        gateway
            .expect_send()
            .withf(move |request| {
                request.message == "Hello team"
                    && request.participant_id.as_str() == "sarah"
                    && request.user_context == expected
            })
            .times(1)
            .returning(|_| Ok(ChatReply::new("Hi Jamie")));
        let fixture = create_fixture(gateway);

        fixture
            .usecase
            .execute("  Hello team  ", &active(&["sarah"]), &conversation)
            .await
            .unwrap()
            .join()
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_name_override_is_kept() {
        // テスト項目: API が返した表示名が返信に保存される
        let mut gateway = MockChatGateway::new();
        gateway.expect_send().returning(|_| {
            Ok(ChatReply {
                text: "Hello!".to_string(),
                display_name: Some("Sarah (PM)".to_string()),
            })
        });
        let fixture = create_fixture(gateway);

        fixture
            .usecase
            .execute("hi", &active(&["sarah"]), &context())
            .await
            .unwrap()
            .join()
            .await;

        let messages = fixture.repository.all().await;
        assert_eq!(messages[1].display_name.as_deref(), Some("Sarah (PM)"));
    }
}
