use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::types::Machine;

pub const DEFAULT_OUTPUT: &str = "ansible/hosts.ini";

/// What the per-host line binds the machine name to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostBinding {
    /// `ansible_host=<address>`
    Address,
    /// `vmid=<id>`
    MachineId,
}

/// Fixed connection settings embedded in the rendered inventory,
/// constructed once at startup.
pub struct InventoryConfig {
    pub group: String,
    pub user: String,
    pub escalate: bool,
    pub interpreter: Option<String>,
    pub binding: HostBinding,
}

impl InventoryConfig {
    /// Settings for the Rocky Linux nodes, keyed by address.
    pub fn rocky() -> Self {
        Self {
            group: "rocky_nodes".to_string(),
            user: "funmicra".to_string(),
            escalate: true,
            interpreter: Some("/usr/bin/python3".to_string()),
            binding: HostBinding::Address,
        }
    }

    /// Minimal settings for the raw Proxmox group, keyed by vmid.
    pub fn proxmox() -> Self {
        Self {
            group: "proxmox".to_string(),
            user: "funmicra".to_string(),
            escalate: false,
            interpreter: None,
            binding: HostBinding::MachineId,
        }
    }
}

/// Render the complete inventory text. Host lines keep the input order;
/// the result ends with a single trailing newline.
pub fn render(machines: &[Machine], cfg: &InventoryConfig) -> String {
    let mut lines = vec![format!("[{}]", cfg.group)];

    for machine in machines {
        let line = match cfg.binding {
            HostBinding::Address => format!(
                "{} ansible_host={}",
                machine.name,
                machine.addr.as_deref().unwrap_or_default()
            ),
            HostBinding::MachineId => format!("{} vmid={}", machine.name, machine.id),
        };
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(format!("[{}:vars]", cfg.group));
    lines.push(format!("ansible_user={}", cfg.user));
    if cfg.escalate {
        lines.push("ansible_become=true".to_string());
    }
    if let Some(interpreter) = &cfg.interpreter {
        lines.push(format!("ansible_python_interpreter={}", interpreter));
    }
    lines.push(String::new());

    lines.join("\n")
}

/// Overwrite the destination with the rendered text. All validation runs
/// before this, so a failed run never touches an existing inventory.
pub fn write(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    debug!("writing {} bytes to {:?}", contents.len(), path);
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn machine(name: &str, id: &str, addr: Option<&str>) -> Machine {
        Machine {
            name: name.to_string(),
            id: id.to_string(),
            addr: addr.map(str::to_string),
        }
    }

    #[test]
    fn test_render_rocky_nodes() {
        let machines = vec![
            machine("ctrl-plane", "100", Some("10.0.0.5")),
            machine("worker-1", "101", Some("10.0.0.6")),
        ];

        let expected = "\
[rocky_nodes]
ctrl-plane ansible_host=10.0.0.5
worker-1 ansible_host=10.0.0.6

[rocky_nodes:vars]
ansible_user=funmicra
ansible_become=true
ansible_python_interpreter=/usr/bin/python3
";

        assert_eq!(render(&machines, &InventoryConfig::rocky()), expected);
    }

    #[test]
    fn test_render_proxmox_vmids() {
        let machines = vec![
            machine("ctrl-plane", "100", None),
            machine("worker-1", "101", None),
        ];

        let expected = "\
[proxmox]
ctrl-plane vmid=100
worker-1 vmid=101

[proxmox:vars]
ansible_user=funmicra
";

        assert_eq!(render(&machines, &InventoryConfig::proxmox()), expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let machines = vec![machine("ctrl-plane", "100", Some("10.0.0.5"))];
        let cfg = InventoryConfig::rocky();

        assert_eq!(render(&machines, &cfg), render(&machines, &cfg));
    }

    #[test]
    fn test_host_lines_follow_input_order() {
        let machines = vec![
            machine("worker-1", "101", Some("10.0.0.6")),
            machine("ctrl-plane", "100", Some("10.0.0.5")),
        ];

        let rendered = render(&machines, &InventoryConfig::rocky());
        let worker = rendered.find("worker-1").unwrap();
        let ctrl = rendered.find("ctrl-plane").unwrap();
        assert!(worker < ctrl);
    }
}
