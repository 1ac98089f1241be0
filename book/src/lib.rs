mod book;
mod polyglot;

pub use book::*;
pub use polyglot::*;
