pub mod dq;
pub mod edscan;
pub mod port;
pub mod scan_settings;

pub use edscan::*;
pub use port::*;
pub use scan_settings::*;
