// The shipped defaults and data files must load as-is.

use std::fs;
use std::path::{Path, PathBuf};

use squadcast_core::config::load_config_from;
use squadcast_core::ScoringPreset;
use squadcast_engine::scoring::set_pieces::SetPieceTable;

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[test]
fn shipped_defaults_load() {
    let dir = std::env::temp_dir().join("squadcast_scaffold_defaults");
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("config")).unwrap();
    for name in ["league.toml", "strategy.toml"] {
        fs::copy(repo_root().join("defaults").join(name), dir.join("config").join(name)).unwrap();
    }

    let config = load_config_from(&dir).unwrap();
    assert_eq!(config.game.budget, 100.0);
    assert_eq!(config.strategy.preset, ScoringPreset::Historical);
    assert!(config.provider.base_url.starts_with("https://"));
    assert!(config.provider.history_batch_size > 0);
}

#[test]
fn shipped_set_piece_table_loads() {
    let table = SetPieceTable::load(&repo_root().join("data/set_pieces.toml")).unwrap();
    assert!(!table.season.is_empty());
}
