//! One game between a human and the engine.

use std::time::Instant;

use anyhow::Result;
use games_gomoku::{GameResult, GameState, Position, Stone};
use mcts::{Evaluator, MctsAgent};
use tracing::{debug, info};

use crate::notation::{column_letter, format_move};

/// Board, engine and seat for the current game.
///
/// Human moves are always played for the side to move, so the human can
/// take over either color after an undo. The seat only decides whether
/// the engine opens a fresh game.
pub struct GameSession<E> {
    state: GameState,
    agent: MctsAgent<E>,
    human: Stone,
    auto_reply: bool,
}

impl<E: Evaluator> GameSession<E> {
    pub fn new(agent: MctsAgent<E>, board_size: usize, human: Stone, auto_reply: bool) -> Self {
        Self {
            state: GameState::new(board_size),
            agent,
            human,
            auto_reply,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn agent(&self) -> &MctsAgent<E> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut MctsAgent<E> {
        &mut self.agent
    }

    pub fn human(&self) -> Stone {
        self.human
    }

    /// Let the engine open if the human sits on white and nothing is played yet.
    pub async fn start(&mut self) -> Result<Option<Position>> {
        if self.state.turn() == 0 && self.human == Stone::White {
            return Ok(Some(self.engine_move().await?));
        }
        Ok(None)
    }

    /// Play a human move, then the engine's answer when auto-reply is on.
    ///
    /// Returns the engine's reply, if one was made. A rejected move leaves
    /// the board untouched.
    pub async fn play_human(&mut self, pos: Position) -> Result<Option<Position>> {
        let player = self.state.current_player();
        self.state.apply_move(pos)?;
        info!(?player, mv = %format_move(pos), turn = self.state.turn(), "Human played");

        if self.auto_reply && !self.state.is_done() {
            return Ok(Some(self.engine_move().await?));
        }
        Ok(None)
    }

    /// Search and play a move for the side to move.
    pub async fn engine_move(&mut self) -> Result<Position> {
        let start = Instant::now();
        let pos = self.agent.choose_move(&self.state).await?;
        self.state.apply_move(pos)?;
        info!(
            mv = %format_move(pos),
            difficulty = %self.agent.difficulty(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Engine played"
        );
        Ok(pos)
    }

    /// Take back the last move.
    pub fn undo(&mut self) -> Result<Position> {
        let pos = self.state.undo_last()?;
        debug!(mv = %format_move(pos), turn = self.state.turn(), "Move undone");
        Ok(pos)
    }

    /// Clear the board and start a new game on the same settings.
    pub async fn restart(&mut self) -> Result<Option<Position>> {
        self.state = GameState::new(self.state.board_size());
        info!("New game");
        self.start().await
    }

    /// Black's winning chances as a percentage.
    pub async fn win_ratio(&self) -> Result<u8> {
        Ok(self.agent.win_ratio(&self.state).await?)
    }

    /// One-line summary of whose turn it is or how the game ended.
    pub fn status(&self) -> String {
        match self.state.result() {
            GameResult::InProgress => format!(
                "{} to move (move {})",
                stone_name(self.state.current_player()),
                self.state.turn() + 1
            ),
            GameResult::BlackWin => "Black wins".to_string(),
            GameResult::WhiteWin => "White wins".to_string(),
            GameResult::Draw => "Draw".to_string(),
        }
    }

    /// Text rendering of the board with lettered columns and numbered rows.
    ///
    /// Black is `X`, white is `O`. The last move is wrapped in brackets.
    pub fn render(&self) -> String {
        let size = self.state.board_size();
        let last = self.state.last_move();
        let mut out = String::new();

        out.push_str("   ");
        for col in 0..size {
            out.push(' ');
            out.push(column_letter(col).unwrap_or('?'));
            out.push(' ');
        }
        out.push('\n');

        for row in 0..size {
            out.push_str(&format!("{:>2} ", row + 1));
            for col in 0..size {
                let pos = Position::new(row, col);
                let cell = match self.state.stone_at(pos) {
                    Some(Stone::Black) => 'X',
                    Some(Stone::White) => 'O',
                    None => '.',
                };
                if last == Some(pos) {
                    out.push_str(&format!("[{}]", cell));
                } else {
                    out.push_str(&format!(" {} ", cell));
                }
            }
            out.push('\n');
        }
        out
    }
}

pub fn stone_name(stone: Stone) -> &'static str {
    match stone {
        Stone::Black => "Black",
        Stone::White => "White",
    }
}
