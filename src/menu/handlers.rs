use crate::component::HighlightReelGenerator;
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_highlight_reel(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    let generator = HighlightReelGenerator::new(config.clone(), Arc::clone(shutdown_signal));

    match generator.run() {
        Ok(updated) => *config = updated,
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)?;
    Ok(())
}
