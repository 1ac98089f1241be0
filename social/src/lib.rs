mod console;
mod mastodon;
mod social;

pub use console::*;
pub use mastodon::*;
pub use social::*;
