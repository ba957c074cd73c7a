//! Command line interface.
//!
//! Every option can also be set through its `KAFKA_CONNECT_*` environment
//! variable; a flag on the command line wins over the environment.

use crate::{
    ApplyMode, ApplyOutcome, ConnectGateway, ConnectorConfig, ConnectorError, ConnectorResult,
    KafkaTopicDiscoverer, ReconciliationController, ReconciliationState, Reconciler,
    S3SinkSettings, SyncConfig, TopicDiscoverer, TopicSet,
};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "kafka-connect-sink", version, about = "Manage Kafka Connect sink connectors")]
pub struct Cli {
    /// TOML file with connection and loop settings
    #[arg(long, env = "KAFKA_CONNECT_CONFIG")]
    pub config: Option<String>,

    /// Kafka Connect REST endpoint
    #[arg(long, env = "KAFKA_CONNECT_URL")]
    pub connect_url: Option<String>,

    /// Kafka bootstrap servers
    #[arg(long, env = "KAFKA_BROKER_URL")]
    pub broker_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an instance of the S3 sink connector.
    ///
    /// A list of topics can be given as TOPICLIST. If not, topics are
    /// discovered from Kafka using --topic-regex and --excluded-topics. Use
    /// --auto-update and --check-interval to keep the connector in sync with
    /// new topics.
    #[command(name = "s3-sink")]
    S3Sink(S3SinkArgs),
}

#[derive(Debug, Clone, Args)]
pub struct S3SinkArgs {
    /// Topics to export; discovered from Kafka when empty
    pub topiclist: Vec<String>,

    /// Name of the connector
    #[arg(short = 'n', long, env = "KAFKA_CONNECT_NAME", default_value = "s3-sink")]
    pub name: String,

    /// S3 bucket name, must exist already
    #[arg(short = 'b', long, env = "KAFKA_CONNECT_S3_BUCKET_NAME", default_value = "")]
    pub bucket_name: String,

    #[arg(short = 'r', long, env = "KAFKA_CONNECT_S3_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Top level directory for the data ingested from Kafka
    #[arg(short = 'd', long, env = "KAFKA_CONNECT_TOPICS_DIR", default_value = "topics")]
    pub topics_dir: String,

    /// Records written to store before invoking file commits
    #[arg(long, env = "KAFKA_CONNECT_S3_FLUSH_SIZE", default_value_t = 3600)]
    pub flush_size: u64,

    /// Interval in milliseconds to invoke file commits
    #[arg(long, env = "KAFKA_CONNECT_S3_ROTATE_INTERVAL_MS", default_value_t = 600_000)]
    pub rotate_interval_ms: u64,

    /// Partition duration in milliseconds used by the time based partitioner
    #[arg(
        short = 'p',
        long,
        env = "KAFKA_CONNECT_S3_PARTITION_DURATION_MS",
        default_value_t = 3_600_000
    )]
    pub partition_duration_ms: u64,

    /// Number of Kafka Connect tasks
    #[arg(short = 't', long, env = "KAFKA_CONNECT_TASKS_MAX", default_value_t = 1)]
    pub tasks_max: u32,

    /// Regex for selecting topics
    #[arg(long, env = "KAFKA_CONNECT_TOPIC_REGEX")]
    pub topic_regex: Option<String>,

    /// Comma separated list of topics to exclude from selection
    #[arg(short = 'e', long, env = "KAFKA_CONNECT_EXCLUDED_TOPICS")]
    pub excluded_topics: Option<String>,

    #[arg(long, env = "KAFKA_CONNECT_S3_LOCALE", default_value = "en-US")]
    pub locale: String,

    #[arg(long, env = "KAFKA_CONNECT_S3_TIMEZONE", default_value = "UTC")]
    pub timezone: String,

    /// Wallclock, Record or RecordField
    #[arg(long, env = "KAFKA_CONNECT_S3_TIMESTAMP_EXTRACTOR", default_value = "Record")]
    pub timestamp_extractor: String,

    /// Record field used as timestamp by the RecordField extractor
    #[arg(long, env = "KAFKA_CONNECT_S3_TIMESTAMP_FIELD", default_value = "time")]
    pub timestamp_field: String,

    /// Show the connector configuration but do not create the connector
    #[arg(long)]
    pub dry_run: bool,

    /// Validate the connector configuration and show the result
    #[arg(short = 'v', long)]
    pub validate: bool,

    /// Check for new topics and update the connector
    #[arg(long)]
    pub auto_update: bool,

    /// Interval in milliseconds to check for new topics
    #[arg(short = 'c', long, env = "KAFKA_CONNECT_CHECK_INTERVAL")]
    pub check_interval: Option<u64>,
}

impl Cli {
    /// Resolve the shared configuration: file, then environment, then flags
    pub fn sync_config(&self) -> ConnectorResult<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::from_file(path)?,
            None => SyncConfig::default(),
        };
        config.apply_env_overrides()?;

        if let Some(url) = &self.connect_url {
            config.connect_url = url.clone();
        }
        if let Some(url) = &self.broker_url {
            config.broker_url = url.clone();
        }

        let Command::S3Sink(args) = &self.command;
        if let Some(regex) = &args.topic_regex {
            config.topic_regex = regex.clone();
        }
        if let Some(excluded) = &args.excluded_topics {
            config.excluded_topics = excluded.clone();
        }
        if let Some(interval) = args.check_interval {
            config.check_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }
}

impl S3SinkArgs {
    pub fn settings(&self) -> S3SinkSettings {
        S3SinkSettings {
            name: self.name.clone(),
            s3_bucket_name: self.bucket_name.clone(),
            s3_region: self.region.clone(),
            topics_dir: self.topics_dir.clone(),
            flush_size: self.flush_size,
            rotate_interval_ms: self.rotate_interval_ms,
            partition_duration_ms: self.partition_duration_ms,
            tasks_max: self.tasks_max,
            locale: self.locale.clone(),
            timezone: self.timezone.clone(),
            timestamp_extractor: self.timestamp_extractor.clone(),
            timestamp_field: self.timestamp_field.clone(),
        }
    }

    /// `--validate` takes precedence over `--dry-run`
    pub fn mode(&self) -> ApplyMode {
        if self.validate {
            ApplyMode::Validate
        } else if self.dry_run {
            ApplyMode::DryRun
        } else {
            ApplyMode::Commit
        }
    }

    /// Run the command; `Ok(false)` means the commit was refused or interrupted
    ///
    /// `shutdown` aborts discovery and apply immediately. Once the loop runs,
    /// it only stops between ticks.
    pub async fn execute<D, G>(
        &self,
        config: &SyncConfig,
        discoverer: D,
        gateway: G,
        shutdown: CancellationToken,
    ) -> ConnectorResult<bool>
    where
        D: TopicDiscoverer,
        G: ConnectGateway,
    {
        let settings = self.settings();
        let base_config = settings.build();
        let controller = ReconciliationController::new(gateway);

        // Interrupting the one-shot phase abandons it; nothing was committed
        let applied = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                println!("Interrupted.");
                return Ok(false);
            }
            applied = self.apply_once(&discoverer, &controller, &settings.name, &base_config) => applied,
        };

        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(ConnectorError::InvalidValidationResponse { raw }) => {
                println!("{}", raw);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        match &outcome {
            ApplyOutcome::NoTopics => println!("No topics to export."),
            ApplyOutcome::Validated { raw } => println!("{}", raw),
            ApplyOutcome::DryRun { config } => println!("{}", config.to_json_pretty()?),
            ApplyOutcome::Rejected { result } => {
                println!("Validation returned {} error(s).", result.error_count);
                println!("Use the --validate option to return the validation results.");
                return Ok(false);
            }
            ApplyOutcome::Committed { .. } => {
                println!("Validation returned 0 error(s).");
                println!("Uploaded {} connector configuration.", settings.name);
            }
        }

        if self.auto_update {
            if let Some(applied) = outcome.committed_topics() {
                let mut reconciler = Reconciler::new(
                    controller,
                    discoverer,
                    settings.name.clone(),
                    base_config,
                    ReconciliationState::new(applied.clone()),
                    Duration::from_millis(config.check_interval_ms),
                );
                reconciler.run(shutdown).await;
                println!("Interrupted.");
            } else {
                info!("Auto-update only follows a committed configuration, not starting the loop");
            }
        }

        Ok(true)
    }

    /// Resolve the topic set and apply it in the selected mode
    async fn apply_once<D, G>(
        &self,
        discoverer: &D,
        controller: &ReconciliationController<G>,
        name: &str,
        base_config: &ConnectorConfig,
    ) -> ConnectorResult<ApplyOutcome>
    where
        D: TopicDiscoverer,
        G: ConnectGateway,
    {
        let topics: TopicSet = if self.topiclist.is_empty() {
            println!("Discovering Kafka topics...");
            let found = discoverer.names().await?;
            println!("Found {} topics.", found.len());
            found
        } else {
            self.topiclist.iter().cloned().collect()
        };

        controller
            .apply(name, base_config, &topics, self.mode())
            .await
    }
}

/// Build the production collaborators and run the parsed command
pub async fn run(cli: Cli, shutdown: CancellationToken) -> ConnectorResult<bool> {
    let config = cli.sync_config()?;
    crate::init_tracing(&config.log_level);

    let discoverer = KafkaTopicDiscoverer::from_config(&config)?;
    let gateway = crate::RestConnectGateway::from_config(&config)?;

    match &cli.command {
        Command::S3Sink(args) => args.execute(&config, discoverer, gateway, shutdown).await,
    }
}
