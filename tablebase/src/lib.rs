mod adjudicate;
mod options;

pub use adjudicate::*;
pub use options::*;
