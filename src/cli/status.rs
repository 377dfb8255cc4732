use crate::config;
use crate::error::Result;
use crate::state::MatchState;

pub fn run(config_path: Option<&str>) -> Result<()> {
    let path = config::resolve_path(config_path);
    println!("Config:     {}", path.display());

    let Ok(cfg) = config::load(&path) else {
        println!();
        println!("No config found. Run `settle init` to set up.");
        return Ok(());
    };

    let state_path = cfg.state_path();
    println!("Data dir:   {}", config::shellexpand_path(&cfg.data_dir));
    println!("State file: {}", state_path.display());

    if state_path.exists() {
        let size = std::fs::metadata(&state_path)?.len();
        let state = MatchState::load(&state_path)?;
        println!();
        println!("State size:      {size} bytes");
        if state.is_empty() {
            println!("Matched entries: none (all pruned)");
        } else {
            println!("Matched entries: {}", state.len());
        }
        if let Some(oldest) = state.oldest() {
            println!("Oldest entry:    {}", oldest.format("%Y-%m-%d"));
        }
    } else {
        println!();
        println!("No match state yet; `settle reconcile` will create it.");
    }

    println!();
    println!("Feeds configured: {}", cfg.digest.feeds.len());
    println!(
        "Ledger API:       {}",
        if cfg.ledger.is_some() { "configured" } else { "not configured" }
    );
    Ok(())
}
