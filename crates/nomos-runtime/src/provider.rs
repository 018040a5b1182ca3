//! `Provider` implementation backed by a running subprocess

use async_trait::async_trait;

use nomos_registry::{Provider, ProviderError};

use crate::manager::ProviderProcess;

#[async_trait]
impl Provider for ProviderProcess {
    fn alias(&self) -> &str {
        ProviderProcess::alias(self)
    }

    async fn initialize(&self, config: serde_json::Value) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client()
            .initialize(self.alias(), config.to_string())
            .await
            .map_err(|e| ProviderError::Initialize {
                alias: self.alias().to_string(),
                message: e.to_string(),
            })?;
        if !response.errors.is_empty() {
            return Err(ProviderError::Initialize {
                alias: self.alias().to_string(),
                message: response.errors.join("; "),
            });
        }
        Ok(response.capabilities)
    }

    async fn get(&self, path: &[String]) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .client()
            .get(path.to_vec())
            .await
            .map_err(|e| ProviderError::Call {
                alias: self.alias().to_string(),
                message: e.to_string(),
            })?;
        if !response.error.is_empty() {
            return Err(ProviderError::Get {
                alias: self.alias().to_string(),
                path: path.join("."),
                message: response.error,
            });
        }
        if response.value_json.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&response.value_json).map_err(|e| ProviderError::Get {
            alias: self.alias().to_string(),
            path: path.join("."),
            message: format!("undecodable value payload: {e}"),
        })
    }

    async fn list(&self) -> Result<Vec<String>, ProviderError> {
        self.client()
            .list()
            .await
            .map(|r| r.keys)
            .map_err(|e| ProviderError::Call {
                alias: self.alias().to_string(),
                message: e.to_string(),
            })
    }

    async fn shutdown(&self) {
        if let Err(e) = self.client().shutdown().await {
            tracing::debug!(alias = self.alias(), error = %e, "shutdown RPC failed");
        }
    }
}
