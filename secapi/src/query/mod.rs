mod common;
pub use self::common::{SearchRequest, SortDirection};

mod filing;
pub use self::filing::FilingQuery;
