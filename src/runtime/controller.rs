//! One-shot apply of a connector configuration.

use crate::{
    ConnectGateway, ConnectorConfig, ConnectorResult, TopicSet, ValidationResult,
};
use tracing::{debug, info, warn};

/// What `apply` should do with the built configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Ask the cluster to validate and hand back its raw answer
    Validate,
    /// Build the configuration without contacting the cluster
    DryRun,
    /// Validate, then upsert if the cluster reports no errors
    Commit,
}

/// Result of a one-shot apply
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The topic set was empty, nothing was sent anywhere
    NoTopics,
    /// `ApplyMode::Validate`: raw validation response body
    Validated { raw: String },
    /// `ApplyMode::DryRun`: the document that would have been sent
    DryRun { config: ConnectorConfig },
    /// `ApplyMode::Commit` stopped before the upsert because validation found errors
    Rejected { result: ValidationResult },
    /// `ApplyMode::Commit` validated and upserted `config`
    Committed {
        topics: TopicSet,
        config: ConnectorConfig,
    },
}

impl ApplyOutcome {
    /// False only for a rejected commit
    pub fn is_success(&self) -> bool {
        !matches!(self, ApplyOutcome::Rejected { .. })
    }

    /// Topics now exported by the remote connector, if this apply changed them
    pub fn committed_topics(&self) -> Option<&TopicSet> {
        match self {
            ApplyOutcome::Committed { topics, .. } => Some(topics),
            _ => None,
        }
    }
}

/// Applies connector configurations through a [`ConnectGateway`]
#[derive(Debug, Clone)]
pub struct ReconciliationController<G: ConnectGateway> {
    gateway: G,
}

impl<G: ConnectGateway> ReconciliationController<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Embed `topics` in `config` and validate, print or commit it
    ///
    /// An empty topic set is a no-op: no connector is created or updated
    /// without anything to export.
    ///
    /// # Errors
    ///
    /// Gateway failures are returned as-is. In `Commit` mode a validation body
    /// that cannot be parsed fails with `ConnectorError::InvalidValidationResponse`
    /// and nothing is upserted.
    pub async fn apply(
        &self,
        name: &str,
        config: &ConnectorConfig,
        topics: &TopicSet,
        mode: ApplyMode,
    ) -> ConnectorResult<ApplyOutcome> {
        if topics.is_empty() {
            info!("No topics to export, skipping connector {}", name);
            return Ok(ApplyOutcome::NoTopics);
        }

        let config = config.with_topics(topics);

        match mode {
            ApplyMode::DryRun => Ok(ApplyOutcome::DryRun { config }),
            ApplyMode::Validate => {
                let raw = self
                    .gateway
                    .validate(config.connector_class(), &config)
                    .await?;
                Ok(ApplyOutcome::Validated { raw })
            }
            ApplyMode::Commit => {
                let raw = self
                    .gateway
                    .validate(config.connector_class(), &config)
                    .await?;
                let result = ValidationResult::parse(&raw)?;
                info!("Validation returned {} error(s)", result.error_count);

                if !result.is_valid() {
                    for (field, errors) in result.field_errors() {
                        warn!("{}: {}", field, errors.join("; "));
                    }
                    return Ok(ApplyOutcome::Rejected { result });
                }

                self.upsert(name, &config).await?;
                Ok(ApplyOutcome::Committed {
                    topics: topics.clone(),
                    config,
                })
            }
        }
    }

    /// Upsert without validating first, as the reconciliation loop does
    pub async fn upsert(&self, name: &str, config: &ConnectorConfig) -> ConnectorResult<()> {
        info!(
            "Uploading {} connector configuration ({} topics)",
            name,
            config.topics().len()
        );
        self.gateway.upsert(name, config).await?;
        debug!("Connector {} configuration accepted", name);
        Ok(())
    }
}
