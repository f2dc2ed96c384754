pub mod cache;
pub mod fetcher;
pub mod publisher;

pub use cache::NotificationCacheRepository;
pub use fetcher::NotificationFetcherRepository;
pub use publisher::NotificationPublisherRepository;
