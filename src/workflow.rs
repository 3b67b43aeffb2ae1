mod checkout;
mod enrollment;
mod query;
mod subscription;

pub use checkout::*;
pub use enrollment::*;
pub use query::*;
pub use subscription::*;
