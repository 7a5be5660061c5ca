use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use colored::*;
use log::info;
use muster_lib::imports::{self, ImportConfig};
use muster_lib::inventory::{self, HostBinding, InventoryConfig};
use muster_lib::terraform::{self, OutputProvider, Snapshot, TerraformCli};
use prettytable::{cell, row, Table};

fn provider(sub: &ArgMatches) -> Result<Box<dyn OutputProvider>> {
    if let Some(path) = sub.value_of("snapshot") {
        Ok(Box::new(Snapshot::load(path)?))
    } else {
        let chdir = sub.value_of("chdir").unwrap_or(terraform::DEFAULT_CHDIR);
        Ok(Box::new(TerraformCli::new(chdir)?))
    }
}

pub(crate) fn inventory(sub: &ArgMatches) -> Result<()> {
    let provider = provider(sub)?;

    let mut cfg = if sub.is_present("vmid") {
        InventoryConfig::proxmox()
    } else {
        InventoryConfig::rocky()
    };
    if let Some(group) = sub.value_of("group") {
        cfg.group = group.to_string();
    }
    if let Some(user) = sub.value_of("user") {
        cfg.user = user.to_string();
    }

    let machines = terraform::machines(provider.as_ref(), cfg.binding == HostBinding::Address)?;
    info!("rendering {} machines into [{}]", machines.len(), cfg.group);
    let rendered = inventory::render(&machines, &cfg);

    let path = Path::new(sub.value_of("output").unwrap_or(inventory::DEFAULT_OUTPUT));
    inventory::write(path, &rendered)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "{} Static inventory written to {}",
        "[OK]".green(),
        path.display()
    );
    Ok(())
}

pub(crate) fn imports(sub: &ArgMatches) -> Result<()> {
    let provider = provider(sub)?;

    let mut cfg = ImportConfig::default();
    if let Some(resource) = sub.value_of("resource") {
        cfg.resource_type = resource.to_string();
    }
    if sub.is_present("raw-id") {
        cfg.node = None;
    } else if let Some(node) = sub.value_of("node") {
        cfg.node = Some(node.to_string());
    }
    if let Some(entries) = sub.values_of("map") {
        cfg.map = parse_map(entries)?;
    }

    let machines = terraform::machines(provider.as_ref(), false)?;

    println!(
        "{} You can now run these Terraform import commands:",
        "[INFO]".blue()
    );
    for line in imports::commands(&machines, &cfg) {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) fn machines(sub: &ArgMatches) -> Result<()> {
    let provider = provider(sub)?;
    let machines = terraform::machines(provider.as_ref(), !sub.is_present("vmid"))?;

    if sub.is_present("json") {
        let stdout = io::stdout();
        let handle = stdout.lock();
        serde_json::to_writer_pretty(handle, &machines)?;
        println!();
    } else {
        let mut table = Table::new();
        table.add_row(row!["Name", "VM ID", "Address"]);

        for machine in machines.into_iter() {
            table.add_row(row![
                machine.name,
                machine.id,
                machine.addr.unwrap_or_default()
            ]);
        }

        table.printstd();
    }

    Ok(())
}

fn parse_map(entries: clap::Values) -> Result<Vec<(String, String)>> {
    entries
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .ok_or_else(|| {
                    anyhow!("--map entries take the form NAME=RESOURCE, got '{}'", entry)
                })
        })
        .collect()
}
