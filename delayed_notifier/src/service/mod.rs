pub mod sender_service;

pub use sender_service::SenderService;
