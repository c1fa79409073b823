use anyhow::{Context, Result};
use lumidesk_core::{AgentConfig, AssembleOptions, CompressConfig, ScoreType, WeakMatchPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_root")]
    pub root: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_data_root(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_chunk_chars() -> usize {
    500
}
fn default_overlap_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_weak_score_threshold")]
    pub weak_score_threshold: f64,
    #[serde(default)]
    pub score_type: ScoreType,
    #[serde(default = "default_quote_max_chars")]
    pub quote_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            weak_score_threshold: default_weak_score_threshold(),
            score_type: ScoreType::default(),
            quote_max_chars: default_quote_max_chars(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_weak_score_threshold() -> f64 {
    0.25
}
fn default_quote_max_chars() -> usize {
    400
}

impl RetrievalConfig {
    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            quote_max_chars: self.quote_max_chars,
            score_type: self.score_type,
        }
    }

    pub fn policy(&self) -> WeakMatchPolicy {
        WeakMatchPolicy::new(self.weak_score_threshold, self.score_type)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub rounds: usize,
    #[serde(default = "default_compress_threshold")]
    pub compress_threshold_tokens: usize,
    #[serde(default = "default_compress_target")]
    pub compress_target_tokens: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            enabled: true,
            rounds: 0,
            compress_threshold_tokens: default_compress_threshold(),
            compress_target_tokens: default_compress_target(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_compress_threshold() -> usize {
    1500
}
fn default_compress_target() -> usize {
    300
}

impl AgentSection {
    /// Core agent settings, with `rounds` overridable from the CLI.
    pub fn agent_config(&self, rounds: Option<usize>) -> AgentConfig {
        AgentConfig {
            rounds: rounds.unwrap_or(self.rounds),
            compress: CompressConfig {
                threshold_tokens: self.compress_threshold_tokens,
                target_tokens: self.compress_target_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            temperature: 0.0,
            base_url: default_base_url(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "openai".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            base_url: default_base_url(),
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_messages() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TokenizerConfig {
    /// HuggingFace `tokenizer.json`; used only with the `hf-tokenizer` feature.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Chunking
    if config.chunking.chunk_chars == 0 {
        anyhow::bail!("chunking.chunk_chars must be > 0");
    }
    if config.chunking.overlap_chars >= config.chunking.chunk_chars {
        anyhow::bail!("chunking.overlap_chars must be < chunking.chunk_chars");
    }

    // Retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !config.retrieval.weak_score_threshold.is_finite() {
        anyhow::bail!("retrieval.weak_score_threshold must be a finite number");
    }
    if config.retrieval.quote_max_chars == 0 {
        anyhow::bail!("retrieval.quote_max_chars must be > 0");
    }
    // Both SQLite ranking modes (cosine and keyword) emit distances.
    if config.retrieval.score_type != ScoreType::Distance {
        anyhow::bail!(
            "retrieval.score_type = \"{}\" is not supported: the SQLite index scores by distance",
            config.retrieval.score_type
        );
    }

    // Session
    if config.session.max_messages < 1 {
        anyhow::bail!("session.max_messages must be >= 1");
    }

    // LLM
    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        anyhow::bail!("llm.temperature must be in [0.0, 2.0]");
    }

    // Embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be > 0");
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}
