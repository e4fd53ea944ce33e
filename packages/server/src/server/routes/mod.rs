// HTTP routes
pub mod auth;
pub mod health;
pub mod jobs;
pub mod scrape;

pub use auth::*;
pub use health::*;
pub use jobs::*;
pub use scrape::*;
