// Configuration loading and parsing (league.toml, strategy.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::price::Price;
use crate::weights::{ScoringPreset, WeightVector};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub game: GameConfig,
    pub provider: ProviderConfig,
    pub strategy: StrategyConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    game: GameConfig,
    provider: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub name: String,
    pub season: String,
    /// Squad budget in millions.
    pub budget: f64,
}

impl GameConfig {
    pub fn budget_price(&self) -> Price {
        Price::from_millions(self.budget)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub history_batch_size: usize,
    pub history_batch_pause_ms: u64,
    /// Upper bound on the whole fetch phase of a run.
    pub fetch_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn history_batch_pause(&self) -> Duration {
        Duration::from_millis(self.history_batch_pause_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    scoring: ScoringSection,
    #[serde(default)]
    optimizer: OptimizerConfig,
    #[serde(default)]
    transfers: TransferConfig,
    #[serde(default)]
    captain: CaptainConfig,
    #[serde(default)]
    chips: ChipConfig,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoringSection {
    preset: ScoringPreset,
    #[serde(default)]
    weights: Option<WeightVector>,
    #[serde(default)]
    params: ScoringParams,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub preset: ScoringPreset,
    /// Explicit `[scoring.weights]` if given, otherwise the preset's.
    pub weights: WeightVector,
    pub params: ScoringParams,
    pub optimizer: OptimizerConfig,
    pub transfers: TransferConfig,
    pub captain: CaptainConfig,
    pub chips: ChipConfig,
}

/// One step of the historical points-to-score mapping.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StepBreakpoint {
    pub min_points: f64,
    pub score: f64,
}

/// Down-weighting applied to high scores of rarely-owned players.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RealityTier {
    pub min_score: f64,
    pub max_ownership: f64,
    pub factor: f64,
}

/// Breakpoints and multipliers used by the scoring model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Weights for the most recent seasons, newest first.
    pub recency_weights: Vec<f64>,
    pub min_season_minutes: u32,
    pub full_season_minutes: f64,
    /// Games used to project per-90 points onto a season.
    pub projection_games: f64,
    /// Most recently completed season label; a player missing it is penalized.
    pub latest_completed_season: Option<String>,
    pub gap_penalty: f64,
    pub declining_minutes_penalty: f64,
    pub declining_minutes_floor: u32,
    /// Sorted by `min_points` descending.
    pub step_breakpoints: Vec<StepBreakpoint>,
    pub below_steps_rate: f64,
    pub below_steps_floor: f64,
    pub unknown_multiplier: f64,
    pub unknown_floor: f64,
    pub unknown_ceiling: f64,
    pub reality_check: Vec<RealityTier>,
    pub fixture_window: usize,
    pub home_multiplier: f64,
    pub away_multiplier: f64,
    pub neutral_fixture_score: f64,
    pub momentum_scale: f64,
    pub season_games: f64,
    pub last_season_blend: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        let step = |min_points, score| StepBreakpoint { min_points, score };
        let tier = |min_score, max_ownership, factor| RealityTier {
            min_score,
            max_ownership,
            factor,
        };
        Self {
            recency_weights: vec![1.0, 0.5, 0.3],
            min_season_minutes: 900,
            full_season_minutes: 3000.0,
            projection_games: 34.0,
            latest_completed_season: None,
            gap_penalty: 0.5,
            declining_minutes_penalty: 0.7,
            declining_minutes_floor: 1800,
            step_breakpoints: vec![
                step(250.0, 100.0),
                step(225.0, 95.0),
                step(200.0, 90.0),
                step(180.0, 80.0),
                step(160.0, 70.0),
                step(140.0, 60.0),
                step(120.0, 50.0),
                step(100.0, 40.0),
                step(80.0, 30.0),
            ],
            below_steps_rate: 0.3,
            below_steps_floor: 5.0,
            unknown_multiplier: 2.5,
            unknown_floor: 5.0,
            unknown_ceiling: 25.0,
            reality_check: vec![tier(60.0, 1.0, 0.4), tier(50.0, 2.0, 0.6), tier(40.0, 3.0, 0.8)],
            fixture_window: 5,
            home_multiplier: 1.1,
            away_multiplier: 0.9,
            neutral_fixture_score: 50.0,
            momentum_scale: 100_000.0,
            season_games: 38.0,
            last_season_blend: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub time_limit_secs: u64,
    pub regular_starter_min_minutes: u32,
    pub min_regular_starters: usize,
    /// Prices below are in millions.
    pub premium_price: f64,
    pub min_premiums: usize,
    pub fodder_price: f64,
    pub max_fodder: usize,
    pub premium_gk_price: f64,
    pub fodder_gk_price: f64,
    pub elite_premium_price: f64,
    /// Zero disables the elite premium rule.
    pub min_elite_premiums: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 60,
            regular_starter_min_minutes: 60,
            min_regular_starters: 11,
            premium_price: 10.0,
            min_premiums: 2,
            fodder_price: 4.5,
            max_fodder: 3,
            premium_gk_price: 4.5,
            fodder_gk_price: 4.0,
            elite_premium_price: 12.0,
            min_elite_premiums: 0,
        }
    }
}

impl OptimizerConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub min_gain: f64,
    /// Points deducted per transfer beyond the free ones.
    pub hit_cost: f64,
    pub max_hit_cost: f64,
    pub candidates_per_position: usize,
    pub max_banked_transfers: u32,
    /// Chance-of-playing below which a player needs replacing.
    pub injury_threshold: u8,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            min_gain: 3.0,
            hit_cost: 4.0,
            max_hit_cost: 8.0,
            candidates_per_position: 20,
            max_banked_transfers: 5,
            injury_threshold: 75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptainConfig {
    pub differential_ownership: f64,
    pub differential_min_points: f64,
    /// Runner-up must reach this fraction of the top prediction.
    pub differential_closeness: f64,
    /// Runner-up ownership must be below this fraction of the top pick's.
    pub differential_ownership_ratio: f64,
    pub triple_captain_confidence: f64,
    /// Price in millions from which a captain option counts as premium.
    pub premium_price: f64,
}

impl Default for CaptainConfig {
    fn default() -> Self {
        Self {
            differential_ownership: 10.0,
            differential_min_points: 7.0,
            differential_closeness: 0.85,
            differential_ownership_ratio: 0.3,
            triple_captain_confidence: 0.75,
            premium_price: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChipConfig {
    pub wildcard_team_issues: usize,
    pub wildcard_injuries: usize,
    pub wildcard_difficulty: f64,
    pub wildcard_windows: Vec<u32>,
    pub free_hit_min_playing: usize,
    pub free_hit_fixture_swing: f64,
    pub free_hit_rotation_risks: usize,
    /// Expensive players below this many minutes count as rotation risks.
    pub rotation_risk_max_minutes: u32,
    pub rotation_risk_min_price: f64,
    pub bench_boost_min_points: f64,
    pub bench_boost_min_value: f64,
    pub triple_captain_min_points: f64,
    pub triple_captain_premium_price: f64,
    pub min_benefit_wildcard: f64,
    pub min_benefit_free_hit: f64,
    pub min_benefit_bench_boost: f64,
    pub min_benefit_triple_captain: f64,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            wildcard_team_issues: 5,
            wildcard_injuries: 3,
            wildcard_difficulty: 3.5,
            wildcard_windows: vec![8, 9, 10, 28, 29, 30],
            free_hit_min_playing: 8,
            free_hit_fixture_swing: 1.5,
            free_hit_rotation_risks: 5,
            rotation_risk_max_minutes: 180,
            rotation_risk_min_price: 8.0,
            bench_boost_min_points: 20.0,
            bench_boost_min_value: 20.0,
            triple_captain_min_points: 10.0,
            triple_captain_premium_price: 13.0,
            min_benefit_wildcard: 10.0,
            min_benefit_free_hit: 15.0,
            min_benefit_bench_boost: 15.0,
            min_benefit_triple_captain: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub set_pieces: String,
    pub snapshot_dir: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let scoring = strategy_file.scoring;
    let weights = scoring
        .weights
        .clone()
        .unwrap_or_else(|| scoring.preset.weights());

    if scoring.preset == ScoringPreset::Custom && scoring.weights.is_none() {
        return Err(ConfigError::ValidationError {
            field: "scoring.weights".into(),
            message: "required when preset is \"custom\"".into(),
        });
    }

    let strategy = StrategyConfig {
        preset: scoring.preset,
        weights,
        params: scoring.params,
        optimizer: strategy_file.optimizer,
        transfers: strategy_file.transfers,
        captain: strategy_file.captain,
        chips: strategy_file.chips,
    };

    let config = Config {
        game: league_file.game,
        provider: league_file.provider,
        strategy,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the workspace root",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // user's copy wins
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying defaults
/// into `config/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let budget = config.game.budget;
    if !budget.is_finite() || budget <= 0.0 {
        return Err(invalid("game.budget", format!("must be > 0, got {budget}")));
    }

    let provider = &config.provider;
    if provider.base_url.trim().is_empty() {
        return Err(invalid("provider.base_url", "must not be empty"));
    }
    let provider_fields: &[(&str, u64)] = &[
        ("provider.request_timeout_secs", provider.request_timeout_secs),
        ("provider.fetch_timeout_secs", provider.fetch_timeout_secs),
        ("provider.history_batch_size", provider.history_batch_size as u64),
        ("provider.cache_max_entries", provider.cache_max_entries as u64),
    ];
    for (name, val) in provider_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    // Weights: finite, non-negative, not all zero
    let weights = &config.strategy.weights;
    if let Some((key, w)) = weights.first_invalid() {
        return Err(invalid(
            &format!("scoring.weights.{key}"),
            format!("must be finite and >= 0, got {w}"),
        ));
    }
    if weights.is_empty() {
        return Err(invalid("scoring.weights", "at least one weight must be > 0"));
    }

    let params = &config.strategy.params;
    if params.recency_weights.is_empty() {
        return Err(invalid("scoring.params.recency_weights", "must not be empty"));
    }
    let descending = params
        .step_breakpoints
        .windows(2)
        .all(|w| w[0].min_points > w[1].min_points && w[0].score >= w[1].score);
    if !descending {
        return Err(invalid(
            "scoring.params.step_breakpoints",
            "must be sorted by min_points descending with non-increasing scores",
        ));
    }
    if params.unknown_floor > params.unknown_ceiling {
        return Err(invalid(
            "scoring.params.unknown_ceiling",
            "must be >= unknown_floor",
        ));
    }
    if params.fixture_window == 0 {
        return Err(invalid("scoring.params.fixture_window", "must be > 0"));
    }

    let optimizer = &config.strategy.optimizer;
    if optimizer.time_limit_secs == 0 {
        return Err(invalid("optimizer.time_limit_secs", "must be > 0"));
    }
    if optimizer.min_regular_starters > 15 {
        return Err(invalid("optimizer.min_regular_starters", "must be <= 15"));
    }

    let transfers = &config.strategy.transfers;
    if transfers.hit_cost <= 0.0 {
        return Err(invalid(
            "transfers.hit_cost",
            format!("must be > 0, got {}", transfers.hit_cost),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
