//! Parsing of terminal input lines.

use anyhow::{anyhow, bail, Result};
use games_gomoku::Position;
use mcts::Difficulty;

use crate::config::{parse_evaluator_kind, EvaluatorKind};
use crate::notation::parse_move;

pub const HELP: &str = "\
Commands:
  h8 | 7,7            play a move (column letter + row, or row,col from 0)
  ai                  let the engine play for the side to move
  undo                take back the last move
  restart             start a new game
  level <easy|medium|hard|0-2>
                      change engine strength
  evaluator <heuristic|uniform|onnx>
                      swap the position evaluator
  board               show the board
  help                show this help
  quit                exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Position),
    EngineMove,
    Undo,
    Restart,
    Level(Difficulty),
    Evaluator(EvaluatorKind),
    Board,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str, board_size: usize) -> Result<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if words.next().is_some() {
            bail!("too many arguments in '{}'", line.trim());
        }

        let command = match (head.to_ascii_lowercase().as_str(), arg) {
            ("ai", None) => Command::EngineMove,
            ("undo", None) => Command::Undo,
            ("restart" | "new", None) => Command::Restart,
            ("board", None) => Command::Board,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            ("level", Some(level)) => Command::Level(level.parse()?),
            ("level", None) => bail!("usage: level <easy|medium|hard|0-2>"),
            ("evaluator", Some(name)) => Command::Evaluator(parse_evaluator_kind(name)?),
            ("evaluator", None) => bail!("usage: evaluator <heuristic|uniform|onnx>"),
            (_, None) if head.chars().any(|c| c.is_ascii_digit()) => {
                Command::Move(parse_move(head, board_size)?)
            }
            // "7, 7" splits into two words.
            (_, Some(rest)) if head.ends_with(',') => {
                Command::Move(parse_move(&format!("{}{}", head, rest), board_size)?)
            }
            _ => return Err(anyhow!("unknown command '{}', type help", line.trim())),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<Command>> {
        Command::parse(line, 15)
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn parses_moves() {
        assert_eq!(
            parse("h8").unwrap(),
            Some(Command::Move(Position::new(7, 7)))
        );
        assert_eq!(
            parse("3,4").unwrap(),
            Some(Command::Move(Position::new(3, 4)))
        );
        assert_eq!(
            parse("3, 4").unwrap(),
            Some(Command::Move(Position::new(3, 4)))
        );
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(parse("AI").unwrap(), Some(Command::EngineMove));
        assert_eq!(parse("undo").unwrap(), Some(Command::Undo));
        assert_eq!(parse("restart").unwrap(), Some(Command::Restart));
        assert_eq!(parse("board").unwrap(), Some(Command::Board));
        assert_eq!(parse("help").unwrap(), Some(Command::Help));
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn parses_level() {
        assert_eq!(
            parse("level hard").unwrap(),
            Some(Command::Level(Difficulty::Hard))
        );
        assert_eq!(
            parse("level 1").unwrap(),
            Some(Command::Level(Difficulty::Medium))
        );
        assert!(parse("level").is_err());
        assert!(parse("level 7").is_err());
    }

    #[test]
    fn parses_evaluator_swap() {
        assert_eq!(
            parse("evaluator uniform").unwrap(),
            Some(Command::Evaluator(EvaluatorKind::Uniform))
        );
        assert!(parse("evaluator").is_err());
    }

    #[test]
    fn rejects_unknown_input() {
        let err = parse("resign").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
        assert!(parse("undo now").is_err());
        assert!(parse("z99").is_err());
    }
}
