pub mod allocator;
pub mod backfill;
pub mod config;
pub mod discovery;
pub mod match_function;
pub mod player_capacity;
