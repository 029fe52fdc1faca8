mod constant;
mod func;
mod injectable;
mod service;

pub use constant::*;
pub use func::*;
pub use injectable::*;
pub use service::*;
