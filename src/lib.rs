pub mod draw;
pub mod logging;
