//! The Tic-Tac-Toe rules engine: the external contract described in the
//! spec's "Game" component, and nothing else — no networking, no
//! invitation bookkeeping.

use std::sync::Mutex;

use oxo_protocol::Role;

use crate::board::{Board, Mark};
use crate::error::GameError;

fn role_to_mark(role: Role) -> Option<Mark> {
    match role {
        Role::First => Some(Mark::X),
        Role::Second => Some(Mark::O),
        Role::Null => None,
    }
}

fn mark_glyph(role: Role) -> char {
    match role {
        Role::First => 'X',
        Role::Second => 'O',
        Role::Null => ' ',
    }
}

/// A parsed, not-yet-applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub role: Role,
    /// 1-9, left-to-right top-to-bottom.
    pub cell: u8,
}

/// The result of successfully applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub terminated: bool,
    /// Valid only when `terminated` is true. `Role::Null` is a draw.
    pub winner: Role,
}

struct GameState {
    board: Board,
    current_turn: Role,
    terminated: bool,
    winner: Role,
}

/// A single Tic-Tac-Toe match. Internally locked so concurrent
/// `apply_move`/`resign` calls (which cannot happen in practice under
/// this server's invitation-state locking, but might under a future
/// caller) observe a consistent board.
pub struct Game {
    state: Mutex<GameState>,
}

impl Game {
    /// A fresh game with `FIRST_PLAYER` to move, no winner, not
    /// terminated.
    pub fn create() -> Self {
        Self {
            state: Mutex::new(GameState {
                board: Board::empty(),
                current_turn: Role::First,
                terminated: false,
                winner: Role::Null,
            }),
        }
    }

    /// Parses `text` against the grammar `"<digit>[<-X|<-O>]"` for the
    /// asserted `role`. `Role::Null` trusts the text's tag if present,
    /// otherwise resolves to whichever side currently has the move.
    pub fn parse_move(&self, role: Role, text: &str) -> Result<Move, GameError> {
        let mut chars = text.chars();
        let first = chars
            .next()
            .ok_or_else(|| GameError::IllegalSyntax(text.to_string()))?;
        if !first.is_ascii_digit() || first == '0' {
            return Err(GameError::IllegalSyntax(text.to_string()));
        }
        let cell = first as u8 - b'0';
        let rest = chars.as_str();

        let tag = if rest.is_empty() {
            None
        } else if rest == "<-X" {
            Some(Role::First)
        } else if rest == "<-O" {
            Some(Role::Second)
        } else {
            return Err(GameError::IllegalSyntax(text.to_string()));
        };

        let resolved = match (role, tag) {
            (Role::Null, Some(tagged)) => tagged,
            (Role::Null, None) => self.state.lock().unwrap().current_turn,
            (asserted, None) => asserted,
            (asserted, Some(tagged)) if asserted == tagged => asserted,
            (_, Some(_)) => {
                return Err(GameError::IllegalSyntax(format!(
                    "tag in {text:?} disagrees with asserted role"
                )))
            }
        };

        Ok(Move {
            role: resolved,
            cell,
        })
    }

    /// Applies `mv`. Fails if the game is terminated, the move's role
    /// isn't the side to move, or the target cell is occupied.
    pub fn apply_move(&self, mv: Move) -> Result<MoveOutcome, GameError> {
        let mark = role_to_mark(mv.role).ok_or(GameError::WrongTurn)?;
        let mut state = self.state.lock().unwrap();

        if state.terminated {
            return Err(GameError::AlreadyTerminated);
        }
        if mv.role != state.current_turn {
            return Err(GameError::WrongTurn);
        }
        if state.board.get(mv.cell).is_some() {
            return Err(GameError::CellOccupied);
        }

        state.board.set(mv.cell, mark);

        if let Some(winning_mark) = state.board.winning_mark() {
            state.terminated = true;
            state.winner = match winning_mark {
                Mark::X => Role::First,
                Mark::O => Role::Second,
            };
        } else if state.board.is_full() {
            state.terminated = true;
            state.winner = Role::Null;
        } else {
            state.current_turn = mv.role.opposite();
        }

        Ok(MoveOutcome {
            terminated: state.terminated,
            winner: state.winner,
        })
    }

    /// Terminates the game with `role`'s opponent as winner. A no-op if
    /// the game already ended.
    pub fn resign(&self, role: Role) -> Role {
        let mut state = self.state.lock().unwrap();
        if !state.terminated {
            state.terminated = true;
            state.winner = role.opposite();
        }
        state.winner
    }

    pub fn is_over(&self) -> bool {
        self.state.lock().unwrap().terminated
    }

    pub fn get_winner(&self) -> Role {
        self.state.lock().unwrap().winner
    }

    /// Multi-line board rendering followed by `"<side> to move\n"`.
    pub fn unparse_state(&self) -> String {
        let state = self.state.lock().unwrap();
        let mut out = state.board.render();
        out.push_str(&format!("{} to move\n", mark_glyph(state.current_turn)));
        out
    }
}

/// Renders a parsed move back to its canonical text form,
/// `"<digit><-<X|O>\n"`.
pub fn unparse_move(mv: Move) -> String {
    format!("{}<-{}\n", mv.cell, mark_glyph(mv.role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_with_first_player_to_move() {
        let game = Game::create();
        assert!(!game.is_over());
        assert_eq!(game.get_winner(), Role::Null);
    }

    #[test]
    fn test_parse_move_plain_digit_uses_current_turn() {
        let game = Game::create();
        let mv = game.parse_move(Role::Null, "5").unwrap();
        assert_eq!(mv, Move { role: Role::First, cell: 5 });
    }

    #[test]
    fn test_parse_move_with_matching_tag() {
        let game = Game::create();
        let mv = game.parse_move(Role::Null, "3<-X").unwrap();
        assert_eq!(mv.role, Role::First);
        let mv = game.parse_move(Role::Null, "3<-O").unwrap();
        assert_eq!(mv.role, Role::Second);
    }

    #[test]
    fn test_parse_move_tag_disagreeing_with_role_fails() {
        let game = Game::create();
        assert!(game.parse_move(Role::First, "3<-O").is_err());
    }

    #[test]
    fn test_parse_move_rejects_out_of_range_digit() {
        let game = Game::create();
        assert!(game.parse_move(Role::Null, "0").is_err());
        assert!(game.parse_move(Role::Null, "x").is_err());
        assert!(game.parse_move(Role::Null, "").is_err());
    }

    #[test]
    fn test_parse_move_and_unparse_move_round_trip() {
        let game = Game::create();
        let mv = game.parse_move(Role::First, "7").unwrap();
        assert_eq!(unparse_move(mv), "7<-X\n");
    }

    #[test]
    fn test_apply_move_rejects_wrong_turn() {
        let game = Game::create();
        let mv = Move { role: Role::Second, cell: 1 };
        assert_eq!(game.apply_move(mv), Err(GameError::WrongTurn));
    }

    #[test]
    fn test_apply_move_rejects_occupied_cell() {
        let game = Game::create();
        game.apply_move(Move { role: Role::First, cell: 1 }).unwrap();
        let result = game.apply_move(Move { role: Role::Second, cell: 1 });
        assert_eq!(result, Err(GameError::CellOccupied));
    }

    #[test]
    fn test_apply_move_after_game_over_fails() {
        let game = Game::create();
        game.resign(Role::First);
        let result = game.apply_move(Move { role: Role::Second, cell: 1 });
        assert_eq!(result, Err(GameError::AlreadyTerminated));
    }

    #[test]
    fn test_winning_sequence_ends_game_with_first_player_winner() {
        // X: 5, 3, 7 (diagonal); O: 1, 2.
        let game = Game::create();
        let moves = [
            (Role::First, 5u8),
            (Role::Second, 1),
            (Role::First, 3),
            (Role::Second, 2),
            (Role::First, 7),
        ];
        let mut outcome = None;
        for (role, cell) in moves {
            outcome = Some(game.apply_move(Move { role, cell }).unwrap());
        }
        let outcome = outcome.unwrap();
        assert!(outcome.terminated);
        assert_eq!(outcome.winner, Role::First);
        assert!(game.is_over());
        assert_eq!(game.get_winner(), Role::First);
    }

    #[test]
    fn test_full_board_without_line_is_a_draw() {
        let game = Game::create();
        // X O X / X O O / O X X — no winner, board fills exactly.
        let moves = [
            (Role::First, 1u8),
            (Role::Second, 2),
            (Role::First, 3),
            (Role::Second, 5),
            (Role::First, 4),
            (Role::Second, 6),
            (Role::First, 8),
            (Role::Second, 7),
            (Role::First, 9),
        ];
        let mut last = None;
        for (role, cell) in moves {
            last = Some(game.apply_move(Move { role, cell }).unwrap());
        }
        let last = last.unwrap();
        assert!(last.terminated);
        assert_eq!(last.winner, Role::Null);
    }

    #[test]
    fn test_resign_sets_opponent_as_winner() {
        let game = Game::create();
        let winner = game.resign(Role::First);
        assert_eq!(winner, Role::Second);
        assert!(game.is_over());
    }

    #[test]
    fn test_resign_after_termination_is_a_no_op() {
        let game = Game::create();
        game.resign(Role::First);
        let winner = game.resign(Role::Second);
        // Still Second (from the first resign); re-resigning does not
        // flip the recorded winner.
        assert_eq!(winner, Role::Second);
    }

    #[test]
    fn test_unparse_state_includes_board_and_turn_line() {
        let game = Game::create();
        let rendered = game.unparse_state();
        assert!(rendered.ends_with("X to move\n"));
        assert_eq!(rendered.lines().count(), 6);
    }
}
