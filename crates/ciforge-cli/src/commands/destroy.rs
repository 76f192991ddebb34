use ciforge_core::Settings;

use crate::wiring;

pub fn run(settings: &Settings, project: &str, region: Option<&str>) -> anyhow::Result<()> {
    let mut orchestrator = wiring::build_orchestrator(settings, project, region)?;
    orchestrator.destroy()?;
    Ok(())
}
