use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

#[cfg(test)]
use crate::error::DeskError;
use crate::error::Result;
use crate::models::ft::ConfirmationRequest;
use crate::repositories::redis_repository::RedisRepository;

/// Confirmations this tool has already issued, keyed by `Res_code`.
#[derive(Clone)]
pub enum ConfirmationLedger {
    Redis(RedisRepository),
    Memory(Arc<Mutex<HashSet<String>>>),
    /// Never holds anything and refuses writes, like a redis that went away.
    #[cfg(test)]
    Unwritable,
}

impl ConfirmationLedger {
    pub fn in_memory() -> Self {
        ConfirmationLedger::Memory(Arc::new(Mutex::new(HashSet::new())))
    }

    pub async fn connect(redis_url: Option<&str>) -> Result<Self> {
        match redis_url {
            Some(url) => {
                info!("Recording confirmations in redis");
                Ok(ConfirmationLedger::Redis(RedisRepository::new(url).await?))
            }
            None => {
                info!("REDIS_URL not set, confirmations are only remembered for this run");
                Ok(Self::in_memory())
            }
        }
    }

    pub async fn is_confirmed(&self, res_code: &str) -> Result<bool> {
        match self {
            ConfirmationLedger::Redis(repo) => repo.has_confirmation(res_code).await,
            ConfirmationLedger::Memory(seen) => Ok(seen.lock().await.contains(res_code)),
            #[cfg(test)]
            ConfirmationLedger::Unwritable => Ok(false),
        }
    }

    pub async fn record(&self, request: &ConfirmationRequest) -> Result<()> {
        match self {
            ConfirmationLedger::Redis(repo) => {
                let value = serde_json::to_string(request)?;
                repo.store_confirmation(&request.res_code, value).await
            }
            ConfirmationLedger::Memory(seen) => {
                seen.lock().await.insert(request.res_code.clone());
                Ok(())
            }
            #[cfg(test)]
            ConfirmationLedger::Unwritable => {
                Err(DeskError::Redis("connection refused".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_ledger_remembers_codes() {
        let ledger = ConfirmationLedger::in_memory();
        let request = ConfirmationRequest {
            auth_token: "tok".to_string(),
            res_code: "RC-1".to_string(),
            date_time: "2026-01-01 00:00:00".to_string(),
            account_number: "4400".to_string(),
            amount: "10.00".to_string(),
        };
        assert!(!ledger.is_confirmed("RC-1").await.unwrap());
        ledger.record(&request).await.unwrap();
        assert!(ledger.is_confirmed("RC-1").await.unwrap());
        assert!(!ledger.is_confirmed("RC-2").await.unwrap());

        let shared = ledger.clone();
        assert!(shared.is_confirmed("RC-1").await.unwrap());
    }
}
