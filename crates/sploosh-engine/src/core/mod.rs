pub use self::{bit_board::*, layout::*, rules::*};

pub(crate) mod bit_board;
pub(crate) mod layout;
pub(crate) mod rules;
