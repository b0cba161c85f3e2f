pub mod cart;
pub mod catalog;
pub mod errors;
pub mod model;
pub mod query;
pub mod util;
pub mod validate;

pub use cart::*;
pub use errors::*;
pub use model::*;
pub use query::*;
