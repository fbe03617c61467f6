//! Quiz session engine.
//!
//! A single-variation state machine. Callers feed it [`QuizEvent`]s and carry
//! out the [`QuizEffect`]s it returns: moving the board, arming timers and
//! forwarding the outcome to the review session. The engine itself performs
//! no I/O and never sleeps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::matching::{classify_move_among, MoveClass};
use crate::quiz::ledger::ReportLedger;
use crate::quiz::line::QuizLine;
use crate::quiz::rules::ChessRules;
use crate::quiz::timer::{TimerAction, TimerHandle, TimerSlot};
use crate::shapes::Brush;
use crate::types::VariationId;

/// Fixed delays pacing the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizTiming {
    /// Pause before the opponent's move is played.
    pub opponent_reply_ms: u64,
    /// How long a rejected move stays on the board before rollback.
    pub reveal_ms: u64,
}

impl QuizTiming {
    pub fn opponent_reply(&self) -> Duration {
        Duration::from_millis(self.opponent_reply_ms)
    }

    pub fn reveal(&self) -> Duration {
        Duration::from_millis(self.reveal_ms)
    }
}

impl Default for QuizTiming {
    fn default() -> Self {
        Self {
            opponent_reply_ms: 500,
            reveal_ms: 1200,
        }
    }
}

/// Ephemeral per-view quiz state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizSession {
    /// Ply index of the next move the player must supply.
    pub quiz_move_index: usize,
    pub failed: bool,
    pub completed: bool,
    pub extra_study: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Idle,
    AwaitingReplay,
    AwaitingPlayerMove,
    Judged(MoveClass),
    VariationComplete,
}

/// How the variation was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Freshly served; starts a new reportable attempt.
    Fresh,
    /// Re-entered without a new load (reload, history navigation).
    Resumed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    PlayerMove(String),
    TimerFired(TimerHandle),
    Restart,
    NavigateAway,
}

/// Terminal result of one pass through a variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub variation_id: VariationId,
    pub passed: bool,
    pub extra_study: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEffect {
    SetPosition {
        fen: String,
    },
    ArmTimer {
        handle: TimerHandle,
        delay: Duration,
    },
    CancelTimer(TimerHandle),
    PlayOpponentMove {
        ply: usize,
        san: String,
        fen: String,
    },
    Judged {
        ply: usize,
        class: MoveClass,
        played: String,
        /// Arrow and square brushes for a rejected move.
        brushes: Option<(Brush, Brush)>,
    },
    RollBack {
        plies: usize,
        fen: String,
    },
    /// Forward to the review session; the only path into the scheduler.
    ReportOutcome(QuizOutcome),
    Completed {
        passed: bool,
        extra_study: bool,
    },
    RestartedAsExtraStudy,
    /// Leave the quiz for a neutral screen.
    ExitToNeutral,
    NothingToReview,
}

pub struct QuizEngine<R> {
    rules: R,
    line: QuizLine,
    ledger: ReportLedger,
    timing: QuizTiming,
    timer: TimerSlot,
    state: QuizState,
    session: QuizSession,
    position: String,
}

impl<R: ChessRules> QuizEngine<R> {
    pub fn new(rules: R, line: QuizLine, ledger: ReportLedger) -> Self {
        let position = line.initial_fen.clone();
        Self {
            rules,
            line,
            ledger,
            timing: QuizTiming::default(),
            timer: TimerSlot::default(),
            state: QuizState::Idle,
            session: QuizSession::default(),
            position,
        }
    }

    pub fn with_timing(mut self, timing: QuizTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Run as extra study: completions never reach the scheduler.
    pub fn extra_study(mut self) -> Self {
        self.session.extra_study = true;
        self
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn line(&self) -> &QuizLine {
        &self.line
    }

    /// Current board position.
    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.timer.pending()
    }

    /// Legal moves for the board widget. Empty unless a player move is awaited.
    pub fn legal_moves(&self) -> Vec<String> {
        if self.state == QuizState::AwaitingPlayerMove {
            self.rules.legal_moves(&self.position)
        } else {
            Vec::new()
        }
    }

    /// Enter the variation.
    pub fn start(&mut self, load: LoadKind) -> Vec<QuizEffect> {
        let variation_id = self.line.variation_id;
        if load == LoadKind::Fresh {
            self.ledger.begin_attempt(variation_id);
        }

        let mut effects = Vec::new();
        self.cancel_timer(&mut effects);

        if self.line.is_degenerate() {
            tracing::warn!(variation_id, "variation has no moves to quiz");
            self.state = QuizState::VariationComplete;
            self.session.completed = true;
            effects.push(QuizEffect::NothingToReview);
            return effects;
        }

        self.enter_line(&mut effects);
        effects
    }

    pub fn handle(&mut self, event: QuizEvent) -> Vec<QuizEffect> {
        let mut effects = Vec::new();
        match event {
            QuizEvent::PlayerMove(san) => self.on_player_move(&san, &mut effects),
            QuizEvent::TimerFired(handle) => match self.timer.fire(handle) {
                Some(action) => self.on_timer(action, &mut effects),
                None => tracing::debug!(handle = handle.id(), "ignoring stale timer"),
            },
            QuizEvent::Restart => self.restart(&mut effects),
            QuizEvent::NavigateAway => {
                self.cancel_timer(&mut effects);
                self.state = QuizState::Idle;
                self.session = QuizSession::default();
            }
        }
        effects
    }

    fn enter_line(&mut self, effects: &mut Vec<QuizEffect>) {
        let start = self.line.start_index;
        self.session.quiz_move_index = start;
        self.session.completed = false;

        match start.checked_sub(1) {
            None => {
                self.set_position(self.line.initial_fen.clone(), effects);
                self.state = QuizState::AwaitingPlayerMove;
            }
            Some(reply_ply) => {
                self.set_position(self.line.fen_before(reply_ply).to_string(), effects);
                self.arm(TimerAction::OpponentReply, effects);
                self.state = QuizState::AwaitingReplay;
            }
        }
        tracing::debug!(
            variation_id = self.line.variation_id,
            start,
            extra_study = self.session.extra_study,
            "entered variation"
        );
    }

    fn on_player_move(&mut self, san: &str, effects: &mut Vec<QuizEffect>) {
        if self.state != QuizState::AwaitingPlayerMove {
            tracing::debug!(san, state = ?self.state, "move outside player turn ignored");
            return;
        }
        let ply = self.session.quiz_move_index;
        let Some(expected) = self.line.plies.get(ply).cloned() else {
            return;
        };
        let legal = self.rules.legal_moves(&self.position);
        let Some(applied) = self.rules.apply(&self.position, san) else {
            tracing::debug!(san, "illegal move ignored");
            return;
        };

        let class =
            classify_move_among(&applied.san, &expected.san, &expected.alt, &expected.alt_fail, &legal).class;
        tracing::debug!(ply, played = %applied.san, class = class.as_str(), "judged move");
        effects.push(QuizEffect::Judged {
            ply,
            class,
            played: applied.san,
            brushes: class.brush_pair(),
        });
        if class.counts_as_failure() {
            self.session.failed = true;
        }

        if class == MoveClass::Correct {
            self.position = expected.fen;
            self.session.quiz_move_index = ply + 2;
            if ply + 1 < self.line.plies.len() {
                self.arm(TimerAction::OpponentReply, effects);
                self.state = QuizState::AwaitingReplay;
            } else {
                self.complete(effects);
            }
        } else {
            self.position = applied.fen;
            self.arm(TimerAction::RevealElapsed, effects);
            self.state = QuizState::Judged(class);
        }
    }

    fn on_timer(&mut self, action: TimerAction, effects: &mut Vec<QuizEffect>) {
        match (action, self.state) {
            (TimerAction::OpponentReply, QuizState::AwaitingReplay) => self.play_reply(effects),
            (TimerAction::RevealElapsed, QuizState::Judged(_)) => self.roll_back(effects),
            (action, state) => tracing::debug!(?action, ?state, "timer does not apply"),
        }
    }

    fn play_reply(&mut self, effects: &mut Vec<QuizEffect>) {
        let next = self.session.quiz_move_index;
        let Some(reply) = next.checked_sub(1).and_then(|ply| self.line.plies.get(ply).cloned()) else {
            self.complete(effects);
            return;
        };

        self.position = reply.fen.clone();
        effects.push(QuizEffect::PlayOpponentMove {
            ply: next - 1,
            san: reply.san,
            fen: reply.fen,
        });

        if next >= self.line.plies.len() {
            self.complete(effects);
        } else {
            self.state = QuizState::AwaitingPlayerMove;
        }
    }

    /// Undo the rejected move and the opponent move before it, then replay
    /// the opponent move.
    fn roll_back(&mut self, effects: &mut Vec<QuizEffect>) {
        let ply = self.session.quiz_move_index;
        match ply.checked_sub(1) {
            None => {
                self.position = self.line.fen_before(0).to_string();
                effects.push(QuizEffect::RollBack {
                    plies: 1,
                    fen: self.position.clone(),
                });
                self.state = QuizState::AwaitingPlayerMove;
            }
            Some(reply_ply) => {
                self.position = self.line.fen_before(reply_ply).to_string();
                effects.push(QuizEffect::RollBack {
                    plies: 2,
                    fen: self.position.clone(),
                });
                self.arm(TimerAction::OpponentReply, effects);
                self.state = QuizState::AwaitingReplay;
            }
        }
    }

    fn complete(&mut self, effects: &mut Vec<QuizEffect>) {
        self.cancel_timer(effects);
        self.state = QuizState::VariationComplete;
        self.session.completed = true;

        let variation_id = self.line.variation_id;
        let passed = !self.session.failed;

        if self.session.extra_study {
            tracing::debug!(variation_id, passed, "extra study complete");
            effects.push(QuizEffect::Completed {
                passed,
                extra_study: true,
            });
            self.session.failed = false;
            return;
        }

        if !self.ledger.try_mark(variation_id) {
            tracing::warn!(variation_id, "completion already reported, leaving quiz");
            effects.push(QuizEffect::ExitToNeutral);
            return;
        }

        effects.push(QuizEffect::ReportOutcome(QuizOutcome {
            variation_id,
            passed,
            extra_study: false,
        }));
        effects.push(QuizEffect::Completed {
            passed,
            extra_study: false,
        });

        if !passed {
            // Retry straight away without touching the schedule again.
            self.session.extra_study = true;
            effects.push(QuizEffect::RestartedAsExtraStudy);
            self.enter_line(effects);
        }
    }

    fn restart(&mut self, effects: &mut Vec<QuizEffect>) {
        if self.line.is_degenerate() {
            return;
        }
        self.cancel_timer(effects);

        if self.session.completed && !self.session.extra_study {
            self.session.extra_study = true;
            self.session.failed = false;
            effects.push(QuizEffect::RestartedAsExtraStudy);
        } else if self.session.extra_study {
            self.session.failed = false;
        }
        self.enter_line(effects);
    }

    fn set_position(&mut self, fen: String, effects: &mut Vec<QuizEffect>) {
        self.position = fen.clone();
        effects.push(QuizEffect::SetPosition { fen });
    }

    fn arm(&mut self, action: TimerAction, effects: &mut Vec<QuizEffect>) {
        let (handle, replaced) = self.timer.arm(action);
        if let Some(old) = replaced {
            effects.push(QuizEffect::CancelTimer(old));
        }
        let delay = match action {
            TimerAction::OpponentReply => self.timing.opponent_reply(),
            TimerAction::RevealElapsed => self.timing.reveal(),
        };
        effects.push(QuizEffect::ArmTimer { handle, delay });
    }

    fn cancel_timer(&mut self, effects: &mut Vec<QuizEffect>) {
        if let Some(handle) = self.timer.cancel() {
            effects.push(QuizEffect::CancelTimer(handle));
        }
    }
}
