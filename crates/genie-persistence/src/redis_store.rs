//! Redis-backed `Store` (spec §4.6). Ported from
//! `examples/original_source/genie_flow/session_lock.py`'s `SessionLockManager`
//! and `store.py`'s `StoreManager`: the same key scheme, the same
//! `redis_lock`-style auto-renewing distributed lock (`auto_renewal=True`),
//! and the same atomic `HINCRBY`-based progress hash.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use uuid::Uuid;

use genie_core::store::{LockHandle, Store};
use genie_core::CoreError;
use genie_domain::{GenieTaskProgress, SessionModel};

use crate::config::GenieRedisConfig;
use crate::keys;
use crate::serialization;

const LOCK_RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

const LOCK_RENEW_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("EXPIRE", KEYS[1], ARGV[2])
else
    return 0
end
"#;

pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
    config: GenieRedisConfig,
    /// Renewal tasks keyed by lock token, so `release_lock` can cancel the
    /// one belonging to the lock it is releasing.
    renewals: Mutex<HashMap<String, tokio::task::JoinHandle<()>>>,
}

impl RedisStore {
    pub async fn connect(config: GenieRedisConfig) -> Result<Self, CoreError> {
        let client = redis::Client::open(config.url.as_str()).map_err(map_redis_err)?;
        let conn = client.get_connection_manager().await.map_err(map_redis_err)?;
        Ok(Self { conn, config, renewals: Mutex::new(HashMap::new()) })
    }

    fn spawn_renewal(&self, key: String, token: String) {
        let mut conn = self.conn.clone();
        let ttl = self.config.lock_ttl_seconds;
        let interval = Duration::from_secs((ttl / 2).max(1));
        let handle = tokio::spawn(async move {
            let script = redis::Script::new(LOCK_RENEW_SCRIPT);
            loop {
                tokio::time::sleep(interval).await;
                let renewed: i64 = match script.key(&key).arg(&token).arg(ttl).invoke_async(&mut conn).await {
                    Ok(v) => v,
                    Err(error) => {
                        tracing::warn!(%error, key, "lock renewal call failed, stopping renewal");
                        break;
                    }
                };
                if renewed == 0 {
                    tracing::debug!(key, "lock no longer held by this token, stopping renewal");
                    break;
                }
            }
        });
        self.renewals.lock().unwrap().insert(token, handle);
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn acquire_lock(&self, session_id: &str) -> Result<LockHandle, CoreError> {
        let key = keys::lock_key(&self.config.app_prefix, session_id);
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + Duration::from_secs(self.config.lock_acquire_timeout_seconds);
        let mut conn = self.conn.clone();

        loop {
            let acquired: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&token)
                .arg("NX")
                .arg("EX")
                .arg(self.config.lock_ttl_seconds)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_err)?;

            if acquired.is_some() {
                self.spawn_renewal(key.clone(), token.clone());
                tracing::debug!(session_id, "acquired session lock");
                return Ok(LockHandle { session_id: session_id.to_string(), token });
            }
            if Instant::now() >= deadline {
                return Err(CoreError::LockAcquireTimeout(session_id.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn release_lock(&self, handle: LockHandle) -> Result<(), CoreError> {
        if let Some(task) = self.renewals.lock().unwrap().remove(&handle.token) {
            task.abort();
        }
        let key = keys::lock_key(&self.config.app_prefix, &handle.session_id);
        let mut conn = self.conn.clone();
        let script = redis::Script::new(LOCK_RELEASE_SCRIPT);
        let _: i64 = script.key(key).arg(&handle.token).invoke_async(&mut conn).await.map_err(map_redis_err)?;
        Ok(())
    }

    async fn load_model(&self, session_id: &str) -> Result<SessionModel, CoreError> {
        let key = keys::object_key(&self.config.app_prefix, keys::SESSION_MODEL_CLASS_NAME, session_id);
        let mut conn = self.conn.clone();
        let payload: Option<Vec<u8>> = conn.get(&key).await.map_err(map_redis_err)?;
        let bytes = payload.ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))?;
        serialization::deserialize_model(&bytes)
    }

    async fn persist_model(&self, model: &SessionModel) -> Result<(), CoreError> {
        let key = keys::object_key(&self.config.app_prefix, keys::SESSION_MODEL_CLASS_NAME, &model.session_id);
        let bytes = serialization::serialize_model(model, self.config.compress)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, bytes, self.config.object_ttl_seconds).await.map_err(map_redis_err)?;
        Ok(())
    }

    async fn progress_start(&self, session_id: &str, task_id: &str, total_subtasks: u64) -> Result<(), CoreError> {
        let key = keys::progress_key(&self.config.app_prefix, session_id);
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .hset(&key, "task_id", task_id)
            .hset(&key, "total_nr_subtasks", total_subtasks)
            .hset(&key, "nr_subtasks_executed", 0u64)
            .hset(&key, "tombstone", "f")
            .expire(&key, self.config.progress_ttl_seconds as i64)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        tracing::info!(session_id, task_id, total_subtasks, "started progress record");
        Ok(())
    }

    async fn progress_grow_total(&self, session_id: &str, delta: u64) -> Result<(), CoreError> {
        let key = keys::progress_key(&self.config.app_prefix, session_id);
        let mut conn = self.conn.clone();
        let _: i64 = conn.hincr(&key, "total_nr_subtasks", delta as i64).await.map_err(map_redis_err)?;
        Ok(())
    }

    async fn progress_increment_done(&self, session_id: &str) -> Result<(), CoreError> {
        let key = keys::progress_key(&self.config.app_prefix, session_id);
        let mut conn = self.conn.clone();
        let _: i64 = conn.hincr(&key, "nr_subtasks_executed", 1).await.map_err(map_redis_err)?;
        Ok(())
    }

    async fn progress_tombstone(&self, session_id: &str) -> Result<(), CoreError> {
        let key = keys::progress_key(&self.config.app_prefix, session_id);
        let mut conn = self.conn.clone();
        let _: () = conn.hset(&key, "tombstone", "t").await.map_err(map_redis_err)?;
        Ok(())
    }

    async fn progress_status(&self, session_id: &str) -> Result<Option<GenieTaskProgress>, CoreError> {
        let key = keys::progress_key(&self.config.app_prefix, session_id);
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(&key).await.map_err(map_redis_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        let parse_u64 = |name: &str| -> Result<u64, CoreError> {
            fields
                .get(name)
                .ok_or_else(|| CoreError::PersistenceError(format!("progress record for {session_id} missing {name}")))?
                .parse()
                .map_err(|_| CoreError::PersistenceError(format!("progress record for {session_id} has non-numeric {name}")))
        };
        Ok(Some(GenieTaskProgress {
            task_id: fields.get("task_id").cloned().unwrap_or_default(),
            total_nr_subtasks: parse_u64("total_nr_subtasks")?,
            nr_subtasks_executed: parse_u64("nr_subtasks_executed")?,
            tombstone: fields.get("tombstone").map(|v| v == "t").unwrap_or(false),
        }))
    }

    async fn progress_delete(&self, session_id: &str) -> Result<(), CoreError> {
        let key = keys::progress_key(&self.config.app_prefix, session_id);
        let mut conn = self.conn.clone();
        let _: () = conn.del(&key).await.map_err(map_redis_err)?;
        tracing::info!(session_id, "deleted progress record");
        Ok(())
    }
}

fn map_redis_err(err: redis::RedisError) -> CoreError {
    CoreError::PersistenceError(err.to_string())
}
