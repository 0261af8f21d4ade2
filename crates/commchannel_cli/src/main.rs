//! CLI demo probe.
//!
//! # Responsibility
//! - Exercise the channel module end-to-end against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use commchannel_core::db::open_db_in_memory;
use commchannel_core::fixture::DemoObjectStore;
use commchannel_core::{ChannelActions, ChannelConfig, ChannelType, OwnerKindRegistry};
use std::error::Error;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn Error>> {
    let mut conn = open_db_in_memory()?;

    let store = DemoObjectStore::new();
    let mut registry = OwnerKindRegistry::new();
    registry.register(Arc::new(store.clone()))?;

    let fred = store.create("Fred");
    let mut actions = ChannelActions::new(&mut conn, &registry, ChannelConfig::default())?;

    actions.add_email_address(&fred, "fred@gmail.com", "Home", Some("Fred's home email"))?;
    let default_kind: ChannelType = actions.default_phone_or_fax_type();
    actions.add_phone_or_fax_number(&fred, default_kind, "0207 999 8888", "Work", None)?;
    actions.add_postal_address(
        &fred,
        "Flat 2a",
        Some("45 Penny Lane"),
        None,
        "Liverpool",
        "L39 5AA",
        "UK",
        "Home",
        None,
        false,
    )?;

    println!("owner={}", fred.name);
    for channel in actions.channels(&fred)? {
        println!(
            "channel type={} purpose={} name={}",
            channel.kind.as_str(),
            channel.purpose,
            channel.name()
        );
    }

    Ok(())
}
