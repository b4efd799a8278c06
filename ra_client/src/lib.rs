#[cfg(test)]
mod arbitrary;
mod channel;
mod config;
mod connection;
mod controller;
mod dispatcher;
mod error;
mod game_list;
mod intent;
mod interaction;
mod notice;
mod pacing;
mod reconciler;
mod session;
mod transport;
pub use channel::*;
pub use config::*;
pub use connection::*;
pub use controller::*;
pub use dispatcher::*;
pub use error::*;
pub use game_list::*;
pub use intent::*;
pub use interaction::*;
pub use notice::*;
pub use pacing::*;
pub use reconciler::*;
pub use session::*;
pub use transport::*;
