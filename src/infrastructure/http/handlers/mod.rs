//! HTTP Handlers

mod audio;
mod maintenance;
mod ping;
mod session;
mod websocket;

pub use audio::*;
pub use maintenance::*;
pub use ping::*;
pub use session::*;
pub use websocket::*;
