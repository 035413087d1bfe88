use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with degraded mode and runtime counters.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.record_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "record store health check failed");
            }
        }
        None => warn!("record store unavailable (degraded mode)"),
    }

    HealthResponse::new(
        state.is_degraded(),
        state.query_cache().len(),
        state.catalog_sse().subscriber_count(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::record_store::memory::MemoryRecordStore, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .set_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
        let _subscriber = state.catalog_sse().subscribe();
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.catalog_subscribers, 1);
    }
}
