//! Proof verification capability.
//!
//! The zero-knowledge proof system is an external collaborator: the
//! synchronizer only needs `verify(circuit, public_signals, proof) -> bool`.
//! Production deployments delegate to a prover service over HTTP; tests
//! plug in a static verifier.

use alloy::primitives::U256;
use async_trait::async_trait;
use murmur_core::ProofKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SyncError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Capability for re-validating a previously submitted proof.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Verify a proof blob against its circuit and public signals.
    ///
    /// `Ok(false)` means the proof is cryptographically invalid; errors are
    /// reserved for the verifier itself being unavailable.
    async fn verify(
        &self,
        circuit: ProofKind,
        public_signals: &[U256],
        proof: &[u8],
    ) -> Result<bool, SyncError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    circuit: &'static str,
    public_signals: &'a [U256],
    proof: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// HTTP client for a prover service exposing `POST /verify`.
#[derive(Clone)]
pub struct HttpProofVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProofVerifier {
    /// Build a verifier client for the given service endpoint.
    pub fn new(endpoint: &str, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .user_agent("murmur-indexer/verifier")
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProofVerifier for HttpProofVerifier {
    async fn verify(
        &self,
        circuit: ProofKind,
        public_signals: &[U256],
        proof: &[u8],
    ) -> Result<bool, SyncError> {
        let request = VerifyRequest {
            circuit: circuit.as_str(),
            public_signals,
            proof: hex::encode(proof),
        };

        let response = self
            .client
            .post(format!("{}/verify", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| SyncError::Verifier(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Verifier(format!(
                "prover service returned {}",
                response.status()
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Verifier(e.to_string()))?;

        Ok(body.valid)
    }
}
