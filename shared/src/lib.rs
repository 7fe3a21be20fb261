//! Types shared between the penalty game server and the browser client.
//!
//! Wire structs derive `TS` so the client's TypeScript bindings are
//! generated from the same definitions.

pub mod game;
pub mod protocol;
pub mod vec3;
