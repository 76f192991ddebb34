use ciforge_core::Settings;

use crate::wiring;

pub fn run(settings: &Settings, project: &str, region: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut orchestrator = wiring::build_orchestrator(settings, project, region)?;
    let info = orchestrator.info()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{info}");
    }
    Ok(())
}
