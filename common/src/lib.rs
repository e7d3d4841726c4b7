mod assignment;
mod capacity;
mod constants;
mod extensions;
mod filter;
mod game_match;
mod game_server;
mod ticket;

pub use assignment::*;
pub use capacity::*;
pub use constants::*;
pub use extensions::*;
pub use filter::*;
pub use game_match::*;
pub use game_server::*;
pub use ticket::*;
