//! IRC line protocol: inbound framing and outbound command lines

mod command;
mod framer;

pub use command::{Command, LINE_SEPARATOR};
pub use framer::LineFramer;
