pub mod scheduled_tasks;
pub mod scrape;

pub use scheduled_tasks::start_scheduler;
pub use scrape::{ScrapeLauncher, ScrapeTrigger};
