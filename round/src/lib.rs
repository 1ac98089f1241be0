pub mod announce;
pub mod controller;
pub mod options;
pub mod persistance;
pub mod record;
pub mod session;
pub mod votes;

pub use crate::announce::*;
pub use crate::controller::*;
pub use crate::options::*;
pub use crate::persistance::*;
pub use crate::record::*;
pub use crate::session::*;
pub use crate::votes::*;
