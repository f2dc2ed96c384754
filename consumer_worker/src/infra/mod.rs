pub mod rabbitmq_receiver;

pub use rabbitmq_receiver::RabbitMqReceiver;
