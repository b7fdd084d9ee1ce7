use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

use artifact_store::ports::inbound::ArtifactStorePort;
use chain_client::ports::inbound::MessageClient;
use node_crypto::Ed25519KeyPair;
use payload_store::ports::inbound::PayloadStorePort;
use phase_tracker::PhaseTracker;

use crate::domain::authz::AuthzCache;
use crate::ports::outbound::{ArtifactAttributionSink, ChainQuery};

pub type ProofRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

pub struct ExecutorServerState {
    pub artifact_store: Arc<dyn ArtifactStorePort>,
    pub payload_store: Arc<dyn PayloadStorePort>,
    pub phase_tracker: Arc<PhaseTracker>,
    pub message_client: Arc<dyn MessageClient>,
    pub chain_query: Arc<dyn ChainQuery>,
    pub attribution_sink: Arc<dyn ArtifactAttributionSink>,
    pub authz_cache: AuthzCache,
    pub signing_key: Ed25519KeyPair,
    pub v2_enabled: bool,
    pub proof_rate_limiter: ProofRateLimiter,
}

impl ExecutorServerState {
    pub fn new(
        artifact_store: Arc<dyn ArtifactStorePort>,
        payload_store: Arc<dyn PayloadStorePort>,
        phase_tracker: Arc<PhaseTracker>,
        message_client: Arc<dyn MessageClient>,
        chain_query: Arc<dyn ChainQuery>,
        attribution_sink: Arc<dyn ArtifactAttributionSink>,
        signing_key: Ed25519KeyPair,
        v2_enabled: bool,
    ) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(5).unwrap())
            .allow_burst(NonZeroU32::new(30).unwrap());
        Self {
            artifact_store,
            payload_store,
            phase_tracker,
            message_client,
            chain_query,
            attribution_sink,
            authz_cache: AuthzCache::new(Duration::from_secs(120)),
            signing_key,
            v2_enabled,
            proof_rate_limiter: RateLimiter::keyed(quota),
        }
    }
}
