mod command;
mod coordinator;

pub use command::*;
pub use coordinator::*;
