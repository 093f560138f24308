mod audit_log;
mod movie;
mod person;
mod report;
mod review;
mod user;

pub use audit_log::*;
pub use movie::*;
pub use person::*;
pub use report::*;
pub use review::*;
pub use user::*;
