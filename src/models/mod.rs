pub mod caption;
pub mod media_item;

pub use caption::*;
pub use media_item::*;
