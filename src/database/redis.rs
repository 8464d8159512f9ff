use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

/// Redis connection wrapper
pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    pub async fn init(redis_url: &str) -> Result<Self, String> {
        let client =
            Client::open(redis_url).map_err(|e| format!("Failed to create Redis client: {}", e))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| format!("Failed to connect to Redis: {}", e))?;

        log::info!("Connected successfully to Redis");

        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Redis-backed sessions and rate-limit counters.
#[derive(Clone)]
pub struct RedisService {
    connection: MultiplexedConnection,
}

impl RedisService {
    pub fn new(client: &RedisClient) -> Self {
        Self {
            connection: client.get_connection(),
        }
    }

    // ============================================
    // Session Management (JWT + Redis)
    // ============================================

    pub async fn store_session(
        &self,
        user_id: &str,
        token: &str,
        expiry_seconds: u64,
    ) -> Result<(), String> {
        let mut conn = self.connection.clone();

        // One live session per user: drop the reverse lookup of the previous token
        if let Some(previous) = self.get_session(user_id).await? {
            conn.del::<_, ()>(token_key(&previous))
                .await
                .map_err(|e| format!("Failed to delete previous token: {}", e))?;
        }

        conn.set_ex::<_, _, ()>(session_key(user_id), token, expiry_seconds)
            .await
            .map_err(|e| format!("Failed to store session: {}", e))?;

        conn.set_ex::<_, _, ()>(token_key(token), user_id, expiry_seconds)
            .await
            .map_err(|e| format!("Failed to store token mapping: {}", e))?;

        Ok(())
    }

    /// Returns the user id the token was issued to, if the session is still live.
    pub async fn validate_session(&self, token: &str) -> Result<Option<String>, String> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(token_key(token))
            .await
            .map_err(|e| format!("Failed to validate session: {}", e))
    }

    pub async fn get_session(&self, user_id: &str) -> Result<Option<String>, String> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(session_key(user_id))
            .await
            .map_err(|e| format!("Failed to get session: {}", e))
    }

    pub async fn invalidate_session(&self, user_id: &str) -> Result<(), String> {
        let mut conn = self.connection.clone();

        if let Some(token) = self.get_session(user_id).await? {
            conn.del::<_, ()>(token_key(&token))
                .await
                .map_err(|e| format!("Failed to delete token: {}", e))?;
        }

        conn.del::<_, ()>(session_key(user_id))
            .await
            .map_err(|e| format!("Failed to delete session: {}", e))?;

        Ok(())
    }

    // ============================================
    // Rate Limiting
    // ============================================

    /// Fixed-window counter; the window starts at the first hit.
    pub async fn rate_limit_increment(
        &self,
        key: &str,
        window_seconds: u64,
    ) -> Result<u64, String> {
        let mut conn = self.connection.clone();
        let rate_key = format!("ratelimit:{}", key);

        let count: u64 = conn
            .incr(&rate_key, 1)
            .await
            .map_err(|e| format!("Failed to increment rate limit: {}", e))?;

        if count == 1 {
            conn.expire::<_, ()>(&rate_key, window_seconds as i64)
                .await
                .map_err(|e| format!("Failed to set rate limit expiry: {}", e))?;
        }

        Ok(count)
    }

    pub async fn is_rate_limited(
        &self,
        key: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> Result<bool, String> {
        let count = self.rate_limit_increment(key, window_seconds).await?;
        Ok(count > max_requests)
    }
}

fn session_key(user_id: &str) -> String {
    format!("session:{}", user_id)
}

fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

pub async fn connect_to_redis(redis_url: &str) -> Result<RedisClient, String> {
    RedisClient::init(redis_url).await
}
