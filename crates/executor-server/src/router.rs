//! Axum router assembly. The returned [`Router`] still needs
//! `into_make_service_with_connect_info::<SocketAddr>()` at the call site
//! so the proof endpoint's per-IP rate limiter has a real client address.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ExecutorServerState;

pub fn build_router(state: Arc<ExecutorServerState>) -> Router {
    Router::new()
        .route("/v1/status", get(handlers::get_status))
        .route("/v1/inference/payloads", get(handlers::get_payload))
        .route("/v1/poc/proofs", post(handlers::get_proofs))
        .route("/v2/poc-batches/generated", post(handlers::post_generated_artifacts))
        .route("/v2/poc-batches/validated", post(handlers::post_validated_artifacts))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use artifact_store::adapters::InMemoryArtifactLog;
    use artifact_store::ManagedArtifactStore;
    use chain_client::adapters::MockChainRpc;
    use chain_client::ChainClientService;
    use node_crypto::Ed25519KeyPair;
    use node_types::{Epoch, TxDeadlineTable};
    use payload_store::ports::outbound::PayloadBackend;
    use payload_store::ManagedPayloadStore;
    use phase_tracker::PhaseTracker;

    use crate::adapters::{MockChainQuery, NullAttributionSink};
    use crate::state::ExecutorServerState;

    #[derive(Default)]
    struct NullPayloadBackend;

    impl PayloadBackend for NullPayloadBackend {
        fn put(
            &self,
            _key: &node_types::PayloadKey,
            _record: &node_types::PayloadRecord,
        ) -> Result<(), payload_store::PayloadStoreError> {
            Ok(())
        }
        fn get(
            &self,
            _key: &node_types::PayloadKey,
        ) -> Result<Option<node_types::PayloadRecord>, payload_store::PayloadStoreError> {
            Ok(None)
        }
        fn delete(&self, _key: &node_types::PayloadKey) -> Result<(), payload_store::PayloadStoreError> {
            Ok(())
        }
    }

    fn test_state(v2_enabled: bool) -> Arc<ExecutorServerState> {
        let epoch = Epoch {
            epoch_index: 0,
            start_block_height: 0,
            poc_start_block_height: 0,
            epoch_length: 1_000,
            poc_stage_duration: 50,
            wind_down_blocks: 10,
        };
        let artifact_store = Arc::new(ManagedArtifactStore::new(Arc::new(InMemoryArtifactLog::new())));
        let payload_store = Arc::new(ManagedPayloadStore::new(
            NullPayloadBackend,
            Duration::from_secs(60),
        ));
        let phase_tracker = PhaseTracker::new(phase_tracker::PhaseSnapshot::genesis(epoch));
        let message_client = Arc::new(ChainClientService::new(
            Arc::new(MockChainRpc::new()),
            TxDeadlineTable::default(),
            Duration::from_secs(30),
        ));
        let chain_query = Arc::new(MockChainQuery::new());
        let attribution_sink = Arc::new(NullAttributionSink);
        Arc::new(ExecutorServerState::new(
            artifact_store,
            payload_store,
            phase_tracker,
            message_client,
            chain_query,
            attribution_sink,
            Ed25519KeyPair::generate(),
            v2_enabled,
        ))
    }

    #[tokio::test]
    async fn status_endpoint_reports_current_phase() {
        let router = build_router(test_state(true));
        let response = router
            .oneshot(Request::builder().uri("/v1/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn v2_callbacks_are_rejected_when_v2_disabled() {
        let router = build_router(test_state(false));
        let body = serde_json::json!({
            "block_height": 0,
            "public_key": "pk",
            "node_id": "n1",
            "artifacts": []
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v2/poc-batches/generated")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
