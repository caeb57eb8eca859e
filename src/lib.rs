pub mod engine;
pub mod user;

pub use engine::{DeviceClass, Error, LicenseEngine, Record, DEFAULT_APPLICATION_ID};
pub use user::{User, Users};
