//! Penalty game server library.
//!
//! The authoritative core of the browser penalty-kick mini-game: the
//! world update loop, scenario/spawn-point lifecycle and the penalty
//! state machine. This module exposes the components for use in tests
//! and binaries.

pub mod animation;
pub mod ball;
pub mod characters;
pub mod config;
pub mod entity;
pub mod error;
pub mod game_loop;
pub mod penalty;
pub mod physics;
pub mod scenario;
pub mod scene;
pub mod scheduler;
pub mod spawn;
pub mod world;
pub mod ws;
