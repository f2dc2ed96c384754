pub mod receiver;
pub mod sender;

pub use receiver::NotificationReceiver;
pub use sender::NotificationSender;
