use redis::{Client, RedisError, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    /// Get a value from cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> redis::RedisResult<Option<T>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await?;

        match value {
            Some(v) => {
                let deserialized = serde_json::from_str(&v).map_err(|e| {
                    redis::RedisError::from((
                        redis::ErrorKind::TypeError,
                        "Deserialization error",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with optional TTL
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> redis::RedisResult<()> {
        let serialized = serde_json::to_string(value).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "Serialization error",
                e.to_string(),
            ))
        })?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(serialized);

        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs());
        }

        cmd.query_async(&mut self.connection.clone()).await
    }

    /// Delete a key from cache
    pub async fn delete(&self, key: &str) -> redis::RedisResult<()> {
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await
    }

    /// Drop the cached public card of a user. Failures are logged, not raised.
    pub async fn invalidate_user(&self, user_id: uuid::Uuid) {
        if let Err(e) = self.delete(&keys::public_user(&user_id.to_string())).await {
            tracing::warn!("Cache error: {}", e);
        }
    }
}

/// Cache key generators
pub mod keys {
    /// Public `{id, name, role}` card of a user
    pub fn public_user(id: &str) -> String {
        format!("user:{}:public", id)
    }
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub public_user_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            public_user_ttl: Duration::from_secs(900), // 15 minutes
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            public_user_ttl: parse_duration_secs("CACHE_TTL_PUBLIC_USERS", 900),
        }
    }
}

fn parse_duration_secs(env_var: &str, default: u64) -> Duration {
    std::env::var(env_var)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

/// Wrapper type for Actix-web app data
pub type CacheData = Arc<RedisCache>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_key_is_namespaced() {
        assert_eq!(keys::public_user("abc"), "user:abc:public");
    }

    #[test]
    fn default_ttl_is_fifteen_minutes() {
        assert_eq!(CacheConfig::default().public_user_ttl, Duration::from_secs(900));
    }
}
