//! Room state machine: board, seats, turn order, and victory rules.

use log::debug;
use rand::Rng;
use shared::{CELL_COUNT, SYMBOL_CHALLENGER, SYMBOL_EMPTY, SYMBOL_OWNER};

pub type RoomId = u32;

/// Stable identity of a player session. Allocated from a generation
/// counter so two sessions picking the same display name can never be
/// confused in seat or turn checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub u32);

/// The two seats of a room. Board cells, the turn pointer and the winner
/// are all recorded as seats, which makes a foreign marker on the board
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Owner,
    Challenger,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::Owner => Seat::Challenger,
            Seat::Challenger => Seat::Owner,
        }
    }
}

/// Why a move was refused. Rejections leave the room untouched.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("cell index {0} is outside the board")]
    OutOfRange(usize),
    #[error("cell {0} is already occupied")]
    CellOccupied(usize),
    #[error("the game already has a winner")]
    GameOver,
    #[error("no challenger has been seated")]
    NoChallenger,
    #[error("player is not seated in this room")]
    NotSeated,
    #[error("it is not this player's turn")]
    NotYourTurn,
}

/// One hosted game: a 3x3 board, an owner seat fixed at creation, an
/// optional challenger seat, and the turn/winner/end bookkeeping.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    owner: PlayerId,
    challenger: Option<PlayerId>,
    board: [Option<Seat>; CELL_COUNT],
    turn_of: Seat,
    winner: Option<Seat>,
    ended_at: Option<u64>,
}

impl Room {
    pub fn new(id: RoomId, owner: PlayerId) -> Self {
        Self {
            id,
            owner,
            challenger: None,
            board: [None; CELL_COUNT],
            turn_of: Seat::Owner,
            winner: None,
            ended_at: None,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn challenger(&self) -> Option<PlayerId> {
        self.challenger
    }

    pub fn turn_of(&self) -> Seat {
        self.turn_of
    }

    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    pub fn ended_at(&self) -> Option<u64> {
        self.ended_at
    }

    /// The room is discoverable while its challenger seat is empty.
    pub fn is_door_open(&self) -> bool {
        self.challenger.is_none()
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if player == self.owner {
            Some(Seat::Owner)
        } else if self.challenger == Some(player) {
            Some(Seat::Challenger)
        } else {
            None
        }
    }

    pub fn player_in(&self, seat: Seat) -> Option<PlayerId> {
        match seat {
            Seat::Owner => Some(self.owner),
            Seat::Challenger => self.challenger,
        }
    }

    pub fn winner_id(&self) -> Option<PlayerId> {
        self.winner.and_then(|seat| self.player_in(seat))
    }

    /// Seats the challenger. The caller checks the door first.
    pub fn set_challenger(&mut self, challenger: PlayerId) {
        debug_assert!(self.challenger.is_none());
        self.challenger = Some(challenger);
    }

    /// Clears board, winner and end stamp. With `remove_challenger` the
    /// challenger seat empties and the owner moves first; otherwise the
    /// seats stay and the first turn is drawn 50/50.
    pub fn reset(&mut self, remove_challenger: bool) {
        if remove_challenger {
            self.challenger = None;
            self.turn_of = Seat::Owner;
        } else {
            self.turn_of = if self.challenger.is_none() || rand::thread_rng().gen_bool(0.5) {
                Seat::Owner
            } else {
                Seat::Challenger
            };
            debug!("room {}: turn of {:?}", self.id, self.turn_of);
        }

        self.board = [None; CELL_COUNT];
        self.winner = None;
        self.ended_at = None;
    }

    /// Applies a move, or rejects it without mutating anything. The
    /// caller has already matched the player's room assignment against
    /// this room; everything else is checked here.
    pub fn try_move(&mut self, player: PlayerId, cell: usize) -> Result<(), MoveError> {
        if cell >= CELL_COUNT {
            return Err(MoveError::OutOfRange(cell));
        }
        if self.board[cell].is_some() {
            return Err(MoveError::CellOccupied(cell));
        }
        if self.winner.is_some() {
            return Err(MoveError::GameOver);
        }
        if self.challenger.is_none() {
            return Err(MoveError::NoChallenger);
        }
        let seat = self.seat_of(player).ok_or(MoveError::NotSeated)?;
        if seat != self.turn_of {
            return Err(MoveError::NotYourTurn);
        }

        self.board[cell] = Some(seat);
        self.winner = self.check_victory();
        self.turn_of = self.turn_of.other();
        Ok(())
    }

    /// First fully matching line wins; rows, then columns, then the two
    /// diagonals, so the reported line is deterministic when several
    /// complete at once.
    pub fn check_victory(&self) -> Option<Seat> {
        for row in 0..3 {
            if let Some(seat) = self.line(row * 3, row * 3 + 1, row * 3 + 2) {
                return Some(seat);
            }
        }
        for col in 0..3 {
            if let Some(seat) = self.line(col, col + 3, col + 6) {
                return Some(seat);
            }
        }
        self.line(0, 4, 8).or_else(|| self.line(2, 4, 6))
    }

    fn line(&self, a: usize, b: usize, c: usize) -> Option<Seat> {
        let seat = self.board[a]?;
        (self.board[b] == Some(seat) && self.board[c] == Some(seat)).then_some(seat)
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none() && self.board.iter().all(|cell| cell.is_some())
    }

    /// A room with a winner or a full board accepts no further moves.
    pub fn is_ended(&self) -> bool {
        self.winner.is_some() || self.board.iter().all(|cell| cell.is_some())
    }

    pub fn mark_ended(&mut self, now: u64) {
        self.ended_at = Some(now);
    }

    pub fn symbol(&self, cell: usize) -> u8 {
        match self.board[cell] {
            None => SYMBOL_EMPTY,
            Some(Seat::Owner) => SYMBOL_OWNER,
            Some(Seat::Challenger) => SYMBOL_CHALLENGER,
        }
    }

    /// The board in wire order, one symbol per cell.
    pub fn symbols(&self) -> [u8; CELL_COUNT] {
        let mut symbols = [SYMBOL_EMPTY; CELL_COUNT];
        for (cell, symbol) in symbols.iter_mut().enumerate() {
            *symbol = self.symbol(cell);
        }
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: PlayerId = PlayerId(1);
    const CHALLENGER: PlayerId = PlayerId(2);

    fn playing_room() -> Room {
        let mut room = Room::new(100, OWNER);
        room.set_challenger(CHALLENGER);
        room
    }

    /// Pokes the board directly so tests can shape arbitrary positions
    /// without scripting alternating moves.
    fn fill(room: &mut Room, cells: &[usize], seat: Seat) {
        for &cell in cells {
            room.board[cell] = Some(seat);
        }
    }

    #[test]
    fn test_new_room_is_open_with_owner_turn() {
        let room = Room::new(100, OWNER);
        assert!(room.is_door_open());
        assert_eq!(room.turn_of(), Seat::Owner);
        assert_eq!(room.winner(), None);
        assert!(!room.is_ended());
        assert_eq!(room.symbols(), [SYMBOL_EMPTY; CELL_COUNT]);
    }

    #[test]
    fn test_all_winning_lines() {
        let lines: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];

        for line in lines {
            for seat in [Seat::Owner, Seat::Challenger] {
                let mut room = playing_room();
                fill(&mut room, &line, seat);
                assert_eq!(room.check_victory(), Some(seat), "line {line:?}");
            }
        }
    }

    #[test]
    fn test_mixed_line_is_no_victory() {
        let mut room = playing_room();
        fill(&mut room, &[0, 1], Seat::Owner);
        fill(&mut room, &[2], Seat::Challenger);
        assert_eq!(room.check_victory(), None);
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let mut room = playing_room();
        // X O X / X O O / O X X, no three in a row anywhere.
        fill(&mut room, &[0, 2, 3, 7, 8], Seat::Owner);
        fill(&mut room, &[1, 4, 5, 6], Seat::Challenger);
        assert_eq!(room.check_victory(), None);
        assert!(room.is_draw());
        assert!(room.is_ended());
    }

    #[test]
    fn test_draw_requires_full_board() {
        let room = playing_room();
        assert!(!room.is_draw());
    }

    #[test]
    fn test_accepted_move_flips_turn() {
        let mut room = playing_room();
        room.turn_of = Seat::Owner;
        room.try_move(OWNER, 0).unwrap();
        assert_eq!(room.turn_of(), Seat::Challenger);
        room.try_move(CHALLENGER, 4).unwrap();
        assert_eq!(room.turn_of(), Seat::Owner);
    }

    #[test]
    fn test_rejected_moves_leave_room_untouched() {
        let mut room = playing_room();
        room.turn_of = Seat::Owner;
        room.try_move(OWNER, 0).unwrap();

        let rejected: [(PlayerId, usize, MoveError); 4] = [
            (CHALLENGER, 9, MoveError::OutOfRange(9)),
            (CHALLENGER, 0, MoveError::CellOccupied(0)),
            (PlayerId(99), 1, MoveError::NotSeated),
            (OWNER, 1, MoveError::NotYourTurn),
        ];

        for (player, cell, expected) in rejected {
            let before = room.clone();
            assert_eq!(room.try_move(player, cell), Err(expected));
            assert_eq!(room.board, before.board);
            assert_eq!(room.turn_of, before.turn_of);
            assert_eq!(room.winner, before.winner);
        }
    }

    #[test]
    fn test_move_needs_challenger() {
        let mut room = Room::new(100, OWNER);
        assert_eq!(room.try_move(OWNER, 0), Err(MoveError::NoChallenger));
    }

    #[test]
    fn test_no_moves_after_victory() {
        let mut room = playing_room();
        fill(&mut room, &[0, 1, 2], Seat::Owner);
        room.winner = room.check_victory();
        assert_eq!(room.winner(), Some(Seat::Owner));
        assert_eq!(room.try_move(CHALLENGER, 5), Err(MoveError::GameOver));
    }

    #[test]
    fn test_winning_move_sets_winner() {
        let mut room = playing_room();
        room.turn_of = Seat::Owner;
        room.try_move(OWNER, 0).unwrap();
        room.try_move(CHALLENGER, 4).unwrap();
        room.try_move(OWNER, 1).unwrap();
        room.try_move(CHALLENGER, 3).unwrap();
        room.try_move(OWNER, 2).unwrap();

        assert_eq!(room.winner(), Some(Seat::Owner));
        assert_eq!(room.winner_id(), Some(OWNER));
        assert!(room.is_ended());
        assert!(!room.is_draw());
    }

    #[test]
    fn test_reset_removing_challenger() {
        let mut room = playing_room();
        room.try_move(if room.turn_of() == Seat::Owner { OWNER } else { CHALLENGER }, 0)
            .unwrap();
        room.mark_ended(42);

        room.reset(true);
        assert!(room.is_door_open());
        assert_eq!(room.turn_of(), Seat::Owner);
        assert_eq!(room.winner(), None);
        assert_eq!(room.ended_at(), None);
        assert_eq!(room.symbols(), [SYMBOL_EMPTY; CELL_COUNT]);
    }

    #[test]
    fn test_reset_keeping_challenger() {
        let mut room = playing_room();
        fill(&mut room, &[0, 1, 2], Seat::Owner);
        room.winner = room.check_victory();
        room.mark_ended(42);

        room.reset(false);
        assert_eq!(room.challenger(), Some(CHALLENGER));
        assert_eq!(room.winner(), None);
        assert_eq!(room.ended_at(), None);
        assert_eq!(room.symbols(), [SYMBOL_EMPTY; CELL_COUNT]);
        assert!(matches!(room.turn_of(), Seat::Owner | Seat::Challenger));
    }

    #[test]
    fn test_symbols_render_both_seats() {
        let mut room = playing_room();
        fill(&mut room, &[0], Seat::Owner);
        fill(&mut room, &[4], Seat::Challenger);
        assert_eq!(&room.symbols(), b"X   O    ");
    }
}
