//! # Grid-Duel Server Library
//!
//! Authoritative server for short-lived two-player sessions of a 3x3
//! grid game over a connectionless transport. The server owns all game
//! truth; clients are untrusted input sources whose only power is to
//! send commands and hope for a broadcast.
//!
//! ## Architecture
//!
//! The server is single-threaded and cooperative. One dispatch loop
//! performs a bounded-wait receive, feeds the datagram to the engine,
//! then runs the two housekeeping sweeps, so no locking exists anywhere
//! in the state model, and every handler either finishes fully or
//! rejects before touching state.
//!
//! Rooms and sessions never reference each other directly. Sessions are
//! keyed by endpoint, rooms by id, and cross-references are id lookups
//! in the opposite collection, which removes any chance of a dangling
//! reference when one side disappears mid-game.
//!
//! Because the transport may silently drop packets, there is no
//! retransmission or acknowledgement layer: a lost request is invisible
//! to the server and the client's only recovery is resending. Rejected
//! operations are equally silent: the absence of the expected broadcast
//! is the protocol's failure signal.
//!
//! ## Module Organization
//!
//! - [`game`]: the room state machine: board, seats, turn order,
//!   victory evaluation, draw detection and both reset flavors.
//! - [`sessions`]: the endpoint-keyed session registry with liveness
//!   timestamps and room assignments.
//! - [`rooms`]: the room collection, monotonic id allocator and the
//!   open-door index driving discovery broadcasts.
//! - [`engine`]: decode, the exhaustive command dispatch, state
//!   mutation, outbound batching and the two sweepers.
//! - [`network`]: the UDP socket, the bounded-wait dispatch loop and
//!   cooperative shutdown.

pub mod engine;
pub mod game;
pub mod network;
pub mod rooms;
pub mod sessions;
