pub mod choice;
pub mod engine;
pub mod game_state;
pub mod material;
pub mod players;
pub mod ranker;
pub mod value;

pub use crate::choice::*;
pub use crate::engine::*;
pub use crate::game_state::*;
pub use crate::material::*;
pub use crate::players::*;
pub use crate::ranker::*;
pub use crate::value::*;
