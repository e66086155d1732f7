//! # Grid-Duel Client Library
//!
//! Thin client for the grid-duel server: it renders the shared state the
//! server broadcasts and forwards typed user intent, nothing more. All
//! game truth lives on the server; a command that displeases it simply
//! produces no broadcast.
//!
//! One `select!` loop owns the socket, stdin and the view, so packet
//! handling and presentation can never race each other.
//!
//! ## Module Organization
//!
//! - [`game`]: the client-side view: last broadcast board, announced
//!   open rooms, and the terminal board drawing.
//! - [`network`]: the socket/stdin loop, command parsing and event
//!   presentation.

pub mod game;
pub mod network;
