pub mod console;
pub mod email;
pub mod telegram;

pub use console::ConsoleSender;
pub use email::EmailSender;
pub use telegram::TelegramSender;
