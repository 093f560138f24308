mod moderation_service;
mod report_service;
mod review_service;

pub use moderation_service::*;
pub use report_service::*;
pub use review_service::*;
