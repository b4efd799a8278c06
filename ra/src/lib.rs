pub use command::*;
pub use errors::*;
pub use game_id::*;
pub use protocol::*;
pub use snapshot::*;
pub use visualization::*;

mod command;
mod errors;
mod game_id;
mod protocol;
mod snapshot;
mod visualization;
