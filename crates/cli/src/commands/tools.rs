//! `cognitor tools` — List the capabilities the planner may call.

use cognitor_core::{CapabilityDescriptor, CapabilityKind};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let registry = cognitor_tools::default_registry(&config.tools)?;

    for line in listing(&registry.list()) {
        println!("{line}");
    }
    Ok(())
}

fn listing(capabilities: &[CapabilityDescriptor]) -> Vec<String> {
    capabilities
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = match c.kind {
                CapabilityKind::SideEffect => " [side effect]",
                CapabilityKind::Compute => "",
            };
            format!("{:>3}. {}{} - {}", i + 1, c.signature(), marker, c.description)
        })
        .collect()
}
