//! Room actor: an isolated Tokio task that owns one trivia game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are processed one at a time, so
//! every operation is atomic with respect to the others. The question
//! fetch is the only thing that runs outside the actor; its result comes
//! back through the same channel as any other command.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use quizforge_protocol::{ConnectionId, GameMode, Recipient, RoomId, ServerEvent};
use quizforge_timer::PhaseTimer;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{
    PlayerRegistry, ProviderError, Question, QuestionProvider,
    QuestionRequest, QuestionSequence, QuestionState, RoomConfig, RoomError,
    RoomState, fallback_questions,
};

/// Username recorded for joins that don't supply one.
const ANONYMOUS: &str = "Anonymous";

/// Channel sender for delivering outbound events to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// What a `start` request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The game began and the first question went out.
    Started,
    /// Questions are still loading; the game starts when they arrive.
    Deferred,
    /// The room is already past its lobby.
    Ignored,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: ConnectionId,
        username: String,
        sender: PlayerSender,
        reply: oneshot::Sender<()>,
    },

    /// Replies `true` if the player was in the room.
    Leave {
        player_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    Start {
        reply: oneshot::Sender<StartOutcome>,
    },

    Answer {
        player_id: ConnectionId,
        answer: String,
        time_taken: f64,
    },

    RequestNext,

    /// Result of the one question fetch, sent by the fetch task.
    QuestionsLoaded(Result<Vec<Question>, ProviderError>),

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub state: RoomState,
    pub mode: GameMode,
    pub player_count: usize,
    /// `None` until the question sequence is loaded.
    pub question_count: Option<usize>,
    /// Cursor position; `None` until the question sequence is loaded.
    pub current_index: Option<usize>,
    /// How long the room has sat Finished with no join since.
    /// `None` unless the room is Finished.
    pub finished_idle: Option<Duration>,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's identifier.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped; every call will fail.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Adds (or resets) a player and broadcasts the lobby. The first join
    /// also kicks off the question fetch, without waiting for it.
    pub async fn join(
        &self,
        player_id: ConnectionId,
        username: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            username: username.into(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Removes a player. Returns `false` if they weren't in the room.
    pub async fn leave(
        &self,
        player_id: ConnectionId,
    ) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Starts the game if the room is still in its lobby.
    pub async fn start(&self) -> Result<StartOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Start { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Submits an answer to the current question (fire-and-forget).
    pub async fn submit_answer(
        &self,
        player_id: ConnectionId,
        answer: impl Into<String>,
        time_taken: f64,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Answer {
            player_id,
            answer: answer.into(),
            time_taken,
        })
        .await
    }

    /// Advances to the next question now instead of waiting for the timer.
    pub async fn request_next(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::RequestNext).await
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down. Pending timers die with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<P: QuestionProvider> {
    room_id: RoomId,
    mode: GameMode,
    category: Option<String>,
    config: RoomConfig,
    state: RoomState,
    questions: QuestionState,
    players: PlayerRegistry,
    /// Per-connection outbound channels.
    senders: HashMap<ConnectionId, PlayerSender>,
    timer: PhaseTimer,
    /// A start arrived while questions were still loading.
    start_pending: bool,
    last_join: Instant,
    finished_at: Option<Instant>,
    provider: Arc<P>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Lets the fetch task report back without keeping the room alive.
    mailbox: mpsc::WeakSender<RoomCommand>,
}

impl<P: QuestionProvider> RoomActor<P> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, mode = %self.mode, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                fired = self.timer.expired() => {
                    tracing::debug!(
                        room_id = %self.room_id,
                        phase = fired.phase,
                        "question time elapsed"
                    );
                    self.advance();
                }
            }
        }

        self.timer.cancel();
        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                username,
                sender,
                reply,
            } => {
                self.handle_join(player_id, username, sender);
                let _ = reply.send(());
            }
            RoomCommand::Leave { player_id, reply } => {
                let removed = self.handle_leave(player_id);
                let _ = reply.send(removed);
            }
            RoomCommand::Start { reply } => {
                let outcome = self.handle_start();
                let _ = reply.send(outcome);
            }
            RoomCommand::Answer {
                player_id,
                answer,
                time_taken,
            } => {
                self.handle_answer(player_id, &answer, time_taken);
            }
            RoomCommand::RequestNext => {
                if self.state.is_active() {
                    self.advance();
                } else {
                    tracing::debug!(
                        room_id = %self.room_id,
                        state = %self.state,
                        "next requested outside a running game, ignoring"
                    );
                }
            }
            RoomCommand::QuestionsLoaded(result) => {
                self.handle_questions_loaded(result);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        player_id: ConnectionId,
        username: String,
        sender: PlayerSender,
    ) {
        let username = if username.trim().is_empty() {
            ANONYMOUS.to_string()
        } else {
            username
        };

        let rejoined = self.players.add(player_id, username);
        self.senders.insert(player_id, sender);
        self.last_join = Instant::now();

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            rejoined,
            players = self.players.len(),
            "player joined"
        );

        if matches!(self.questions, QuestionState::NotFetched) {
            self.begin_fetch();
        }

        self.broadcast_lobby();
    }

    fn handle_leave(&mut self, player_id: ConnectionId) -> bool {
        if self.players.remove(player_id).is_none() {
            tracing::debug!(
                room_id = %self.room_id,
                %player_id,
                "leave from non-member, ignoring"
            );
            return false;
        }
        self.senders.remove(&player_id);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        self.broadcast_lobby();
        true
    }

    fn handle_start(&mut self) -> StartOutcome {
        if !self.state.is_lobby() {
            tracing::debug!(
                room_id = %self.room_id,
                state = %self.state,
                "start requested past the lobby, ignoring"
            );
            return StartOutcome::Ignored;
        }

        match self.questions {
            QuestionState::Ready(_) => {
                self.begin_game();
                StartOutcome::Started
            }
            QuestionState::Fetching => {
                tracing::info!(
                    room_id = %self.room_id,
                    "start requested while questions load, deferring"
                );
                self.start_pending = true;
                StartOutcome::Deferred
            }
            QuestionState::NotFetched => {
                self.begin_fetch();
                self.start_pending = true;
                StartOutcome::Deferred
            }
        }
    }

    fn handle_answer(
        &mut self,
        player_id: ConnectionId,
        answer: &str,
        time_taken: f64,
    ) {
        if !self.state.is_active() {
            tracing::debug!(
                room_id = %self.room_id,
                %player_id,
                "answer outside a running game, ignoring"
            );
            return;
        }

        let Some(question) =
            self.questions.sequence().and_then(QuestionSequence::current)
        else {
            return;
        };
        let is_correct = question.is_correct(answer);
        let correct_answer = question.correct_answer.clone();

        let mode = self.mode;
        let Some(player) = self.players.get_mut(player_id) else {
            tracing::debug!(
                room_id = %self.room_id,
                %player_id,
                "answer from non-member, ignoring"
            );
            return;
        };
        let earned = player.record_answer(mode, is_correct, time_taken);

        tracing::debug!(
            room_id = %self.room_id,
            %player_id,
            is_correct,
            earned,
            "answer scored"
        );

        self.dispatch(
            Recipient::Connection(player_id),
            ServerEvent::AnswerResult {
                is_correct,
                earned,
                correct_answer,
            },
        );
        self.dispatch(
            Recipient::Room,
            ServerEvent::ScoreUpdate {
                players: self.players.scoreboard(),
            },
        );
    }

    fn handle_questions_loaded(
        &mut self,
        result: Result<Vec<Question>, ProviderError>,
    ) {
        if !self.questions.is_fetching() {
            tracing::debug!(
                room_id = %self.room_id,
                "unexpected question delivery, ignoring"
            );
            return;
        }

        let questions = match result {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    "provider returned no questions, using fallback"
                );
                fallback_questions()
            }
            Err(e) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    error = %e,
                    "question fetch failed, using fallback"
                );
                fallback_questions()
            }
        };

        tracing::info!(
            room_id = %self.room_id,
            count = questions.len(),
            "questions ready"
        );
        self.questions = QuestionState::Ready(QuestionSequence::new(questions));

        if std::mem::take(&mut self.start_pending) && self.state.is_lobby() {
            self.begin_game();
        }
    }

    /// Marks the fetch in progress, then hands it to a separate task.
    fn begin_fetch(&mut self) {
        self.questions = QuestionState::Fetching;

        let request = QuestionRequest {
            count: self.config.question_count,
            category: self.category.clone(),
            mode: self.mode,
        };
        let provider = Arc::clone(&self.provider);
        let mailbox = self.mailbox.clone();
        tracing::debug!(room_id = %self.room_id, ?request, "fetching questions");

        tokio::spawn(async move {
            let result = provider.fetch(request).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(RoomCommand::QuestionsLoaded(result)).await;
            }
        });
    }

    fn begin_game(&mut self) {
        let Some(seq) = self.questions.sequence_mut() else {
            return;
        };
        seq.rewind();
        let total = seq.len();

        self.transition(RoomState::InProgress);
        tracing::info!(
            room_id = %self.room_id,
            players = self.players.len(),
            questions = total,
            "game started"
        );

        self.dispatch(
            Recipient::Room,
            ServerEvent::GameStarted {
                total_questions: total,
            },
        );
        self.send_question();
    }

    /// Broadcasts the current question and arms the phase timer for it.
    fn send_question(&mut self) {
        let Some(seq) = self.questions.sequence() else {
            return;
        };
        let Some(question) = seq.current() else {
            return;
        };
        let event = ServerEvent::Question {
            index: seq.index(),
            total: seq.len(),
            question: question.prompt.clone(),
            options: question.options.clone(),
            duration: self.config.question_duration.as_secs(),
        };
        let index = seq.index();

        self.dispatch(Recipient::Room, event);
        let phase = self.timer.arm(self.config.phase_budget());
        tracing::debug!(room_id = %self.room_id, index, phase, "question sent");
    }

    /// Moves to the next question, or ends the game after the last one.
    /// Shared by the timer and by explicit next requests.
    fn advance(&mut self) {
        if !self.state.is_active() {
            return;
        }
        let Some(seq) = self.questions.sequence_mut() else {
            return;
        };
        if seq.advance() {
            self.finish();
        } else {
            self.send_question();
        }
    }

    fn finish(&mut self) {
        self.transition(RoomState::Finished);
        self.timer.cancel();
        self.finished_at = Some(Instant::now());

        let leaderboard = self.players.leaderboard();
        tracing::info!(
            room_id = %self.room_id,
            players = leaderboard.len(),
            "game over"
        );
        self.dispatch(Recipient::Room, ServerEvent::GameOver { leaderboard });
    }

    fn transition(&mut self, to: RoomState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal room transition {} -> {to}",
            self.state
        );
        tracing::debug!(room_id = %self.room_id, from = %self.state, %to, "state change");
        self.state = to;
    }

    fn broadcast_lobby(&self) {
        self.dispatch(
            Recipient::Room,
            ServerEvent::LobbyUpdate {
                players: self.players.lobby(),
            },
        );
    }

    /// Delivers an event to its recipients. Closed receivers are skipped
    /// silently; the disconnect path cleans them up.
    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::Room => {
                for player in self.players.iter() {
                    self.send_to(player.id, event.clone());
                }
            }
            Recipient::Connection(id) => self.send_to(id, event),
        }
    }

    fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        let seq = self.questions.sequence();
        let finished_idle = self.finished_at.map(|finished| {
            Instant::now().saturating_duration_since(finished.max(self.last_join))
        });
        RoomInfo {
            room_id: self.room_id.clone(),
            state: self.state,
            mode: self.mode,
            player_count: self.players.len(),
            question_count: seq.map(QuestionSequence::len),
            current_index: seq.map(QuestionSequence::index),
            finished_idle,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room<P: QuestionProvider>(
    room_id: RoomId,
    mode: GameMode,
    category: Option<String>,
    config: RoomConfig,
    provider: Arc<P>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = RoomActor {
        room_id: room_id.clone(),
        mode,
        category: category.filter(|c| !c.is_empty()),
        config,
        state: RoomState::Lobby,
        questions: QuestionState::NotFetched,
        players: PlayerRegistry::new(),
        senders: HashMap::new(),
        timer: PhaseTimer::new(),
        start_pending: false,
        last_join: Instant::now(),
        finished_at: None,
        provider,
        receiver: rx,
        mailbox: tx.downgrade(),
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
