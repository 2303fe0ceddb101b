#![deny(unused_must_use)]
//! Metering counters and the idle-session sweeper.

pub mod metering;
pub mod sweeper;

pub use metering::MeteringService;
pub use sweeper::IdleSessionSweeper;
