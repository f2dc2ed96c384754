pub mod entities;
pub mod repository;

pub use entities::{Channel, Content, Notification};
pub use repository::{NotificationRepository, PostgresNotificationRepository};
