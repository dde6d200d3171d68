//! `packets` command
//!
//! Lists the packets a catalog offers, in the order and with the indices
//! used for packet selection.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::args::{OutputFormat, PacketsArgs};
use crate::config::{ConfigLoader, Packet, SuspectRole};
use crate::error::InterrogationError;
use crate::observability::EventEmitter;
use crate::session::InterviewRegistry;

#[derive(Debug, Serialize)]
struct PacketEntry<'a> {
    index: usize,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    roles: &'a [SuspectRole],
}

/// List catalog packets.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn run(args: &PacketsArgs) -> Result<(), InterrogationError> {
    let loaded = ConfigLoader::with_defaults().load(&args.config)?;
    let registry = InterviewRegistry::new(loaded.config, Arc::new(EventEmitter::noop()));

    let entries: Vec<PacketEntry<'_>> = registry
        .packets()
        .iter()
        .enumerate()
        .map(|(index, packet)| entry(index, packet))
        .collect();

    match args.format {
        OutputFormat::Human => {
            for entry in &entries {
                println!("{}", render(entry));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

fn entry(index: usize, packet: &Packet) -> PacketEntry<'_> {
    PacketEntry {
        index,
        name: &packet.name,
        description: packet.description.as_deref(),
        roles: &packet.roles,
    }
}

fn render(entry: &PacketEntry<'_>) -> String {
    let types: Vec<String> = entry.roles.iter().map(|r| r.role_type.to_string()).collect();
    let mut line = format!("{:>3}  {} [{}]", entry.index, entry.name, types.join(", "));
    if let Some(description) = entry.description {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}
