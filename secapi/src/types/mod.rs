mod search;
pub use self::search::{SearchPage, ShapeError};
