pub mod definition;
pub mod ids;
pub mod rows;

pub use definition::*;
pub use ids::*;
pub use rows::*;
