use anyhow::{Error, anyhow};
use cucumber::{gherkin::Step, given};

use crate::fsm::world::FsmWorld;

// =============================================================================
// Configuration Steps
// =============================================================================

#[given(expr = "the cache configuration:")]
fn cache_configuration(world: &mut FsmWorld, step: &Step) -> Result<(), Error> {
    let yaml = step
        .docstring
        .as_ref()
        .ok_or_else(|| anyhow!("configuration step needs a docstring"))?;
    world.config = yaml.clone();
    world.engine = None;
    Ok(())
}

#[given(expr = "rule {string} is disabled")]
fn rule_disabled(world: &mut FsmWorld, name: String) -> Result<(), Error> {
    let engine = world.engine()?;
    if !engine.rules().set_enabled(&name, false) {
        return Err(anyhow!("unknown rule `{name}`"));
    }
    Ok(())
}

#[given(expr = "caching is switched off")]
fn caching_switched_off(world: &mut FsmWorld) -> Result<(), Error> {
    world.switch.disable();
    Ok(())
}

// =============================================================================
// Store Fault Steps
// =============================================================================

#[given(expr = "the store accepts {int} body bytes per entry")]
fn store_write_limit(world: &mut FsmWorld, limit: usize) -> Result<(), Error> {
    world.store.short_write_after(limit);
    Ok(())
}

#[given(expr = "the store fails to create entries")]
fn store_fails_create(world: &mut FsmWorld) -> Result<(), Error> {
    world.store.fail_create(true);
    Ok(())
}
