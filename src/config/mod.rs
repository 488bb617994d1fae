//! Configuration module

mod site;

pub use site::CloudinaryConfig;
pub use site::Environment;
pub use site::HighlightConfig;
pub use site::LikesConfig;
pub use site::NotifyConfig;
pub use site::SiteConfig;
