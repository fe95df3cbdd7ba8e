use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::error::AppResult;

/// Keys of cached catalog reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Free-text search results (query, limit)
    SongSearch(String, usize),
    /// Most popular songs of the whole catalog (limit)
    TopSongs(usize),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::SongSearch(query, limit) => {
                write!(f, "songs:search:{}:{}", limit, query.trim().to_lowercase())
            }
            CacheKey::TopSongs(limit) => write!(f, "songs:top:{}", limit),
        }
    }
}

/// Creates a Redis client for caching
///
/// The client connects lazily; no I/O happens here.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Read-through cache over Redis with non-blocking writes
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    writer: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until its queue is flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");

        if let Err(e) = self.writer.await {
            tracing::error!(error = %e, "Cache writer task did not finish cleanly");
        }
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let writer = tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle {
            shutdown_tx,
            writer,
        };

        (cache, handle)
    }

    /// Background task that drains cache write messages into Redis
    ///
    /// On shutdown, everything already queued is written before the task exits.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut failed_writes: u64 = 0;

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        failed_writes += 1;
                        tracing::error!(error = %e, failed_writes, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing queued writes");

                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!(failed_writes, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for writing without waiting on Redis
    ///
    /// Serialization or queueing failures are logged and otherwise ignored.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Nothing listens on port 1, so every connection attempt is refused
    fn unreachable_client() -> Client {
        create_redis_client("redis://127.0.0.1:1").unwrap()
    }

    #[test]
    fn test_cache_key_display_search() {
        let key = CacheKey::SongSearch("Queen".to_string(), 20);
        assert_eq!(key.to_string(), "songs:search:20:queen");
    }

    #[test]
    fn test_cache_key_display_search_normalizes() {
        let key = CacheKey::SongSearch("  LED Zeppelin ".to_string(), 20);
        assert_eq!(key.to_string(), "songs:search:20:led zeppelin");
    }

    #[test]
    fn test_cache_key_display_top_songs() {
        let key = CacheKey::TopSongs(10);
        assert_eq!(key.to_string(), "songs:top:10");
    }

    #[test]
    fn test_create_redis_client_rejects_bad_url() {
        assert!(create_redis_client("not a url").is_err());
    }

    #[tokio::test]
    async fn test_get_from_cache_surfaces_connection_failure() {
        let (cache, _handle) = Cache::new(unreachable_client()).await;

        let result: AppResult<Option<Vec<String>>> =
            cache.get_from_cache(&CacheKey::TopSongs(10)).await;

        assert!(matches!(result, Err(AppError::Cache(_))));
    }

    #[tokio::test]
    async fn test_set_in_background_does_not_block_on_failure() {
        let (cache, handle) = Cache::new(unreachable_client()).await;

        cache.set_in_background(&CacheKey::TopSongs(10), &vec!["a".to_string()], 60);
        handle.shutdown().await;
    }

    /// Reads a `<prefix><number>\r\n` header, returning the number and the next offset
    fn read_header(buf: &[u8], start: usize, prefix: u8) -> Option<(usize, usize)> {
        if *buf.get(start)? != prefix {
            return None;
        }
        let end = buf[start..].windows(2).position(|w| w == b"\r\n")? + start;
        let value = std::str::from_utf8(&buf[start + 1..end]).ok()?.parse().ok()?;
        Some((value, end + 2))
    }

    /// Parses one RESP array of bulk strings, `None` until it is complete
    fn parse_command(buf: &[u8]) -> Option<(Vec<String>, usize)> {
        let (count, mut pos) = read_header(buf, 0, b'*')?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let (len, start) = read_header(buf, pos, b'$')?;
            let end = start + len;
            if buf.len() < end + 2 {
                return None;
            }
            args.push(String::from_utf8_lossy(&buf[start..end]).into_owned());
            pos = end + 2;
        }
        Some((args, pos))
    }

    /// Minimal Redis stand-in that acknowledges everything and counts SETEX calls
    async fn counting_redis() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let writes = Arc::new(AtomicUsize::new(0));

        let counter = writes.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = counter.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        let n = match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        buf.extend_from_slice(&chunk[..n]);

                        while let Some((args, used)) = parse_command(&buf) {
                            buf.drain(..used);
                            let command = args
                                .first()
                                .map(|c| c.to_ascii_uppercase())
                                .unwrap_or_default();
                            let reply: &[u8] = match command.as_str() {
                                "SETEX" => {
                                    counter.fetch_add(1, Ordering::SeqCst);
                                    b"+OK\r\n"
                                }
                                "GET" => b"$-1\r\n",
                                _ => b"+OK\r\n",
                            };
                            if socket.write_all(reply).await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });

        (format!("redis://{}", addr), writes)
    }

    #[tokio::test]
    async fn test_shutdown_flushes_queued_writes() {
        let (url, writes) = counting_redis().await;
        let (cache, handle) = Cache::new(create_redis_client(&url).unwrap()).await;

        for limit in 1..=10 {
            cache.set_in_background(&CacheKey::TopSongs(limit), &vec![limit], 60);
        }
        handle.shutdown().await;

        assert_eq!(writes.load(Ordering::SeqCst), 10);
    }
}
