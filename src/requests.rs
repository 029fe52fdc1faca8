mod arguments;
mod path;

pub use arguments::*;
pub use path::*;
