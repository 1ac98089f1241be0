mod input_parser;
mod options;
mod output;
mod uci;

pub use input_parser::*;
pub use options::*;
pub use output::*;
pub use uci::*;
