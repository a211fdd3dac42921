mod sweeper;

pub use sweeper::{RetentionSweeper, SweepReport};
