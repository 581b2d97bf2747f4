pub mod command;
pub mod parser;
pub mod response;
pub mod send_receive;
pub mod session;
pub mod status;
pub mod wait_state;

pub use command::*;
pub use response::*;
pub use send_receive::*;
pub use session::DeviceSession;
pub use status::*;
