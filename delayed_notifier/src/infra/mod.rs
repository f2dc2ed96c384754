pub mod rabbitmq_publisher;
pub mod redis_cache;

pub use rabbitmq_publisher::RabbitMqPublisher;
pub use redis_cache::RedisNotificationCache;
