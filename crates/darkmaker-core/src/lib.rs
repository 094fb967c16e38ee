pub mod calibrate;
pub mod console;
pub mod consts;
pub mod error;
pub mod frame;
pub mod group;
pub mod io;
pub mod session;
pub mod stack;
