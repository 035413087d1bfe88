use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::{debug, info};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Bounded exponential backoff applied while waiting for the first ping.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Pings attempted before giving up.
    pub max_attempts: u32,
    /// Wait after the first failed ping.
    pub initial_delay: Duration,
    /// Upper bound for the wait between pings.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Live driver handles for the storefront database.
pub struct Connection {
    // Owns the pool backing `database`.
    #[allow(dead_code)]
    pub client: Client,
    /// Storefront database handle.
    pub database: Database,
}

/// Open a client for `config` and wait until its database answers a ping.
pub async fn connect_with_retry(config: &MongoConfig, policy: RetryPolicy) -> MongoResult<Connection> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!(database = %config.database_name, attempt, "MongoDB reachable");
                return Ok(Connection { client, database });
            }
            Err(source) if attempt >= max_attempts => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                debug!(attempt, error = %err, "MongoDB ping failed; retrying");
                sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
            }
        }
    }
}
