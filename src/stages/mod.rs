pub mod classify;
pub mod crop;
pub mod fetch;
pub mod locate;
pub mod narrative;
pub mod retrieve;
