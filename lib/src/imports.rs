use std::collections::HashMap;

use regex::Regex;

use crate::types::Machine;

pub const DEFAULT_RESOURCE_TYPE: &str = "proxmox_vm_qemu";
pub const DEFAULT_NODE: &str = "Dell-Optiplex";

/// The built-in machine-to-resource map. Machines folded into one indexed
/// resource share an entry; anything unmapped goes through `sanitize`.
pub fn default_map() -> Vec<(String, String)> {
    [
        ("ctrl-plane", "ctrl-plane"),
        ("worker-1", "workers"),
        ("worker-2", "workers"),
    ]
    .iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

pub struct ImportConfig {
    pub resource_type: String,
    /// Proxmox node embedded in composed import IDs as `<node>/qemu/<id>`;
    /// `None` emits the raw backend identifier instead.
    pub node: Option<String>,
    pub map: Vec<(String, String)>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            resource_type: DEFAULT_RESOURCE_TYPE.to_string(),
            node: Some(DEFAULT_NODE.to_string()),
            map: default_map(),
        }
    }
}

/// Replace anything terraform's resource naming grammar won't accept
/// with an underscore.
pub fn sanitize(name: &str) -> String {
    let pattern = Regex::new("[^A-Za-z0-9_-]").unwrap();
    pattern.replace_all(name, "_").to_string()
}

fn resource_name(cfg: &ImportConfig, name: &str) -> String {
    cfg.map
        .iter()
        .find(|(from, _)| from == name)
        .map(|(_, to)| to.clone())
        .unwrap_or_else(|| sanitize(name))
}

fn import_id(cfg: &ImportConfig, machine: &Machine) -> String {
    match &cfg.node {
        Some(node) => format!("{}/qemu/{}", node, machine.id),
        None => machine.id.clone(),
    }
}

/// One ready-to-run `terraform import` line per machine, in input order.
/// Machines mapped to the same resource get consecutive zero-based
/// indices, first seen first.
pub fn commands(machines: &[Machine], cfg: &ImportConfig) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut lines = Vec::with_capacity(machines.len());

    for machine in machines {
        let resource = resource_name(cfg, &machine.name);
        let index = seen.entry(resource.clone()).or_insert(0);
        lines.push(format!(
            "terraform import \"{}.{}[{}]\" \"{}\"",
            cfg.resource_type,
            resource,
            index,
            import_id(cfg, machine)
        ));
        *index += 1;
    }

    lines
}
