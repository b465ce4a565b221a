use tokio::sync::Mutex as AsyncMutex;

/// Serializes tests that touch `FINCHAT_*` environment variables.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());
