//! Client-side view of the shared state: the last board the server
//! broadcast and the rooms announced as open.

use shared::{ServerEvent, CELL_COUNT, SYMBOL_EMPTY};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct ClientGameState {
    board: [u8; CELL_COUNT],
    open_rooms: BTreeSet<u32>,
    in_game: bool,
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            board: [SYMBOL_EMPTY; CELL_COUNT],
            open_rooms: BTreeSet::new(),
            in_game: false,
        }
    }

    /// Folds one server event into the view. The server is authoritative,
    /// so events are applied verbatim, never validated.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::AnnounceRoom { room_id } => {
                self.open_rooms.insert(*room_id);
            }
            ServerEvent::StartGame => {
                self.board = [SYMBOL_EMPTY; CELL_COUNT];
                self.in_game = true;
            }
            ServerEvent::UpdateField { symbols } => {
                self.board = *symbols;
                self.in_game = true;
            }
            ServerEvent::ResetClient => {
                self.board = [SYMBOL_EMPTY; CELL_COUNT];
                self.in_game = false;
            }
        }
    }

    pub fn in_game(&self) -> bool {
        self.in_game
    }

    pub fn open_rooms(&self) -> impl Iterator<Item = u32> + '_ {
        self.open_rooms.iter().copied()
    }

    pub fn board(&self) -> &[u8; CELL_COUNT] {
        &self.board
    }

    /// Draws the board the way it goes on screen, cells numbered row-major
    /// 0..=8 on the wire.
    pub fn render_board(&self) -> String {
        let symbol = |cell: usize| self.board[cell] as char;
        format!(
            " {} | {} | {} \n---+---+---\n {} | {} | {} \n---+---+---\n {} | {} | {} ",
            symbol(0),
            symbol(1),
            symbol(2),
            symbol(3),
            symbol(4),
            symbol(5),
            symbol(6),
            symbol(7),
            symbol(8),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_lobby() {
        let state = ClientGameState::new();
        assert!(!state.in_game());
        assert_eq!(state.board(), &[SYMBOL_EMPTY; CELL_COUNT]);
        assert_eq!(state.open_rooms().count(), 0);
    }

    #[test]
    fn test_announces_accumulate_sorted() {
        let mut state = ClientGameState::new();
        state.apply(&ServerEvent::AnnounceRoom { room_id: 102 });
        state.apply(&ServerEvent::AnnounceRoom { room_id: 100 });
        state.apply(&ServerEvent::AnnounceRoom { room_id: 102 });

        let rooms: Vec<u32> = state.open_rooms().collect();
        assert_eq!(rooms, vec![100, 102]);
    }

    #[test]
    fn test_start_game_clears_board() {
        let mut state = ClientGameState::new();
        state.apply(&ServerEvent::UpdateField { symbols: *b"XO XO XO " });
        state.apply(&ServerEvent::StartGame);

        assert!(state.in_game());
        assert_eq!(state.board(), &[SYMBOL_EMPTY; CELL_COUNT]);
    }

    #[test]
    fn test_reset_returns_to_lobby() {
        let mut state = ClientGameState::new();
        state.apply(&ServerEvent::StartGame);
        state.apply(&ServerEvent::UpdateField { symbols: *b"X        " });
        state.apply(&ServerEvent::ResetClient);

        assert!(!state.in_game());
        assert_eq!(state.board(), &[SYMBOL_EMPTY; CELL_COUNT]);
    }

    #[test]
    fn test_render_board_places_symbols() {
        let mut state = ClientGameState::new();
        state.apply(&ServerEvent::UpdateField { symbols: *b"X   O   X" });

        let drawing = state.render_board();
        let lines: Vec<&str> = drawing.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], " X |   |   ");
        assert_eq!(lines[2], "   | O |   ");
        assert_eq!(lines[4], "   |   | X ");
    }
}
