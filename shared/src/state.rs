use std::sync::Arc;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use coursefile_atoms::{ApprovalStore, DynamoStore, MemoryStore};

use crate::config::{Config, StoreBackend};

/// Everything a request handler needs, built once per cold start.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ApprovalStore>,
    /// Absent when running against the memory store.
    pub cognito_client: Option<CognitoClient>,
}

impl AppState {
    pub async fn from_config(config: Config) -> Self {
        match config.store_backend {
            StoreBackend::DynamoDb => {
                let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let store = DynamoStore::new(DynamoClient::new(&aws), config.table_name.clone());
                tracing::info!("Using DynamoDB table {}", config.table_name);
                if let Some(pool) = &config.cognito_user_pool_id {
                    tracing::info!("Verifying access tokens against user pool {}", pool);
                }
                Self {
                    cognito_client: Some(CognitoClient::new(&aws)),
                    store: Arc::new(store),
                    config,
                }
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Self::with_store(config, Arc::new(MemoryStore::new()))
            }
        }
    }

    /// State over an existing store with no identity provider.
    pub fn with_store(config: Config, store: Arc<dyn ApprovalStore>) -> Self {
        Self {
            config,
            store,
            cognito_client: None,
        }
    }
}
