// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud KMS service for encrypting/decrypting stored OAuth credentials.
//!
//! Uses direct KMS encryption with additional authenticated data (AAD) that
//! binds each ciphertext to the user it belongs to. A token copied onto a
//! different user document will not decrypt.

use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// KMS encryption service.
#[derive(Clone)]
pub struct KmsService {
    /// Full resource path to the KMS key
    /// Format: projects/{project}/locations/{location}/keyRings/{ring}/cryptoKeys/{key}
    key_path: String,

    /// GCP KMS client (None in mock mode)
    client: Option<std::sync::Arc<google_cloud_kms::client::Client>>,
}

impl KmsService {
    const KEY_RING_NAME: &str = "interview-scheduler";

    #[cfg(debug_assertions)]
    const MOCK_PREFIX: &str = "mock";

    /// Connect to GCP KMS.
    pub async fn new(project_id: &str, location: &str, key_name: &str) -> anyhow::Result<Self> {
        let key_path = format!(
            "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}",
            project_id,
            location,
            Self::KEY_RING_NAME,
            key_name
        );

        let config = google_cloud_kms::client::ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| anyhow!("Failed to create KMS auth config: {}", e))?;

        let client = google_cloud_kms::client::Client::new(config)
            .await
            .map_err(|e| anyhow!("Failed to create KMS client: {}", e))?;

        Ok(Self {
            key_path,
            client: Some(std::sync::Arc::new(client)),
        })
    }

    /// Create a mock KMS service for testing (offline mode).
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            key_path: "projects/mock/locations/mock/keyRings/mock/cryptoKeys/mock".to_string(),
            client: None,
        }
    }

    /// Encrypt plaintext, optionally bound to `aad`.
    /// Returns base64-encoded ciphertext.
    pub async fn encrypt(&self, plaintext: &str, aad: Option<&[u8]>) -> anyhow::Result<String> {
        use google_cloud_googleapis::cloud::kms::v1::EncryptRequest;

        #[cfg(debug_assertions)]
        {
            if self.client.is_none() {
                return Ok(format!(
                    "{}:{}:{}",
                    Self::MOCK_PREFIX,
                    BASE64.encode(aad.unwrap_or_default()),
                    BASE64.encode(plaintext)
                ));
            }
        }

        // Release builds have no mock mode; a missing client is an error.
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow!("KMS client not connected"))?;

        let req = EncryptRequest {
            name: self.key_path.clone(),
            plaintext: plaintext.as_bytes().to_vec(),
            additional_authenticated_data: aad.map(<[u8]>::to_vec).unwrap_or_default(),
            ..Default::default()
        };

        let response = client
            .encrypt(req, None)
            .await
            .map_err(|e| anyhow!("KMS encrypt failed: {}", e))?;

        Ok(BASE64.encode(response.ciphertext))
    }

    /// Decrypt base64-encoded ciphertext. `aad` must match what was used to
    /// encrypt.
    pub async fn decrypt(&self, ciphertext_b64: &str, aad: Option<&[u8]>) -> anyhow::Result<String> {
        use google_cloud_googleapis::cloud::kms::v1::DecryptRequest;

        #[cfg(debug_assertions)]
        {
            if self.client.is_none() {
                return Self::mock_decrypt(ciphertext_b64, aad);
            }
        }

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow!("KMS client not connected"))?;

        let ciphertext = BASE64
            .decode(ciphertext_b64)
            .context("Base64 ciphertext decode failed")?;

        let req = DecryptRequest {
            name: self.key_path.clone(),
            ciphertext,
            additional_authenticated_data: aad.map(<[u8]>::to_vec).unwrap_or_default(),
            ..Default::default()
        };

        let response = client
            .decrypt(req, None)
            .await
            .map_err(|e| anyhow!("KMS decrypt failed: {}", e))?;

        String::from_utf8(response.plaintext).context("UTF-8 decode failed")
    }

    #[cfg(debug_assertions)]
    fn mock_decrypt(ciphertext: &str, aad: Option<&[u8]>) -> anyhow::Result<String> {
        let mut parts = ciphertext.splitn(3, ':');
        let (Some(Self::MOCK_PREFIX), Some(bound), Some(body)) =
            (parts.next(), parts.next(), parts.next())
        else {
            bail!("Malformed mock ciphertext");
        };

        let bound = BASE64.decode(bound).context("Base64 decode failed (mock)")?;
        if bound != aad.unwrap_or_default() {
            bail!("KMS decrypt failed (mock): additional authenticated data mismatch");
        }

        let bytes = BASE64.decode(body).context("Base64 decode failed (mock)")?;
        String::from_utf8(bytes).context("UTF-8 decode failed (mock)")
    }
}
