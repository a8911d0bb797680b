//! Built-in capabilities for cognitor.
//!
//! Pure math families (arithmetic, algebra, geometry, statistics, logic)
//! plus the capabilities that reach outside the process: salary lookup in
//! SQLite, presentation authoring on disk, and email over SMTP.

pub mod algebra;
pub mod arithmetic;
pub mod email;
pub mod expression;
pub mod fallback;
pub mod geometry;
pub mod logic;
pub mod math;
pub mod presentation;
pub mod salary;
pub mod statistics;

use cognitor_config::ToolsConfig;
use cognitor_core::{Capability, CapabilityRegistry, RegistryError};
use std::sync::Arc;

pub use email::{MailError, Mailer, SendEmail, SmtpMailer};
pub use fallback::FallbackReasoning;
pub use math::MathCapability;
pub use presentation::{DeckError, DeckStore, PresentationCapability};
pub use salary::{SalaryDb, SalaryError, SalaryLookup};

fn register_all<C: Capability + 'static>(
    registry: &mut CapabilityRegistry,
    family: Vec<C>,
) -> Result<(), RegistryError> {
    for capability in family {
        registry.register(Box::new(capability))?;
    }
    Ok(())
}

/// Registry with every built-in capability, in listing order.
///
/// Nothing is opened here: the salary database and the deck file are
/// touched on first use, and email credentials are checked at send time.
pub fn default_registry(config: &ToolsConfig) -> Result<CapabilityRegistry, RegistryError> {
    let mut registry = CapabilityRegistry::new();
    register_all(&mut registry, arithmetic::capabilities())?;
    register_all(&mut registry, algebra::capabilities())?;
    register_all(&mut registry, geometry::capabilities())?;
    register_all(&mut registry, statistics::capabilities())?;
    register_all(&mut registry, logic::capabilities())?;

    let db = Arc::new(SalaryDb::new(&config.salary_db_path));
    registry.register(Box::new(SalaryLookup::by_id(db.clone())))?;
    registry.register(Box::new(SalaryLookup::by_name(db)))?;

    let deck = Arc::new(DeckStore::new(&config.presentation_path));
    register_all(&mut registry, PresentationCapability::all(deck))?;

    registry.register(Box::new(SendEmail::from_config(&config.email)))?;
    registry.register(Box::new(FallbackReasoning::new()))?;

    tracing::debug!(capabilities = registry.len(), "Capability registry built");
    Ok(registry)
}
