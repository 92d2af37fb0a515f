pub mod model;
pub mod token;
pub mod util;
