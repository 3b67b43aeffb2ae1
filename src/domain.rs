mod enrollment;
mod subscription;
mod tier;

pub use enrollment::*;
pub use subscription::*;
pub use tier::*;

/// Generate a new opaque record identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
