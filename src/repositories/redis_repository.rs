use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::RedisConnectionManager;
use tracing::warn;

use crate::error::Result;

const REDIS_PREFIX: &str = "ftres";
//7 days
const CONFIRMATION_TTL_SECS: usize = 7 * 86400;

#[derive(Clone)]
pub struct RedisRepository {
    redis_client: Pool<RedisConnectionManager>,
}

impl RedisRepository {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let redis_manager = RedisConnectionManager::new(redis_url)?;
        let redis_pool = Pool::builder().build(redis_manager).await?;
        Ok(Self {
            redis_client: redis_pool,
        })
    }

    fn key(res_code: &str) -> String {
        format!("{}:{}", REDIS_PREFIX, res_code)
    }

    pub async fn has_confirmation(&self, res_code: &str) -> Result<bool> {
        let mut redis_conn = self.redis_client.get().await?;
        let exists: bool = redis_conn.exists(Self::key(res_code)).await?;
        Ok(exists)
    }

    pub async fn store_confirmation(&self, res_code: &str, value: String) -> Result<()> {
        let mut redis_conn = self.redis_client.get().await?;
        let res: std::result::Result<(), _> = redis_conn
            .set_ex(Self::key(res_code), value, CONFIRMATION_TTL_SECS)
            .await;
        if let Err(e) = res {
            warn!("Something went wrong populating redis: {:?}", e);
            return Err(e.into());
        }
        Ok(())
    }
}
