pub mod movielens;
pub mod redis;

pub use movielens::load_catalog;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
