pub mod category;
pub mod channel;
pub mod interaction;
pub mod item;
pub mod order;
pub mod recommendation;
