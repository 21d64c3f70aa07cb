pub mod client;
pub mod enums;
pub mod reference;

pub use client::*;
pub use enums::*;
pub use reference::*;
