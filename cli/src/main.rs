mod cli;

use anyhow::{bail, Result};
use clap::{App, Arg};
use colored::*;

fn main() {
    if let Err(err) = run() {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut app = App::new("muster")
        .version("0.3.0")
        .author("funmicra")
        .about("Render Ansible inventories and terraform import commands from Terraform outputs")
        .subcommand(
            App::new("inventory")
                .about("Write the static Ansible inventory")
                .arg(chdir_arg())
                .arg(snapshot_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .takes_value(true)
                        .value_name("FILE")
                        .help("destination inventory file"),
                )
                .arg(
                    Arg::new("group")
                        .short('g')
                        .long("group")
                        .takes_value(true)
                        .value_name("NAME")
                        .help("inventory group name"),
                )
                .arg(
                    Arg::new("user")
                        .short('u')
                        .long("user")
                        .takes_value(true)
                        .value_name("NAME")
                        .help("ansible connection user"),
                )
                .arg(
                    Arg::new("vmid")
                        .long("vmid")
                        .help("bind hosts to their Proxmox vmid instead of an address"),
                ),
        )
        .subcommand(
            App::new("imports")
                .about("Print terraform import commands for the provisioned machines")
                .arg(chdir_arg())
                .arg(snapshot_arg())
                .arg(
                    Arg::new("resource")
                        .short('r')
                        .long("resource")
                        .takes_value(true)
                        .value_name("TYPE")
                        .help("terraform resource type to import into"),
                )
                .arg(
                    Arg::new("node")
                        .short('n')
                        .long("node")
                        .takes_value(true)
                        .value_name("NAME")
                        .help("Proxmox node embedded in composed import IDs"),
                )
                .arg(
                    Arg::new("raw-id")
                        .long("raw-id")
                        .conflicts_with("node")
                        .help("emit the backend identifier without the node/qemu prefix"),
                )
                .arg(
                    Arg::new("map")
                        .short('m')
                        .long("map")
                        .takes_value(true)
                        .multiple_occurrences(true)
                        .value_name("NAME=RESOURCE")
                        .help("replace the built-in machine-to-resource map"),
                ),
        )
        .subcommand(
            App::new("machines")
                .about("Show the machines described by the terraform outputs")
                .arg(chdir_arg())
                .arg(snapshot_arg())
                .arg(Arg::new("json").short('j').long("json").help("format as json"))
                .arg(Arg::new("vmid").long("vmid").help("skip the address output")),
        );

    let mut help_text = Vec::new();
    app.write_help(&mut help_text)
        .expect("Failed to write help text to buffer");
    let matches = app.get_matches();

    match matches.subcommand() {
        Some(("inventory", sub)) => {
            pretty_env_logger::init();
            cli::inventory(sub)
        }
        Some(("imports", sub)) => {
            pretty_env_logger::init();
            cli::imports(sub)
        }
        Some(("machines", sub)) => {
            pretty_env_logger::init();
            cli::machines(sub)
        }
        _ => {
            bail!(
                "Invalid subcommand\n {}",
                String::from_utf8(help_text).expect("help text contains invalid UTF8")
            )
        }
    }
}

fn chdir_arg() -> Arg<'static> {
    Arg::new("chdir")
        .short('C')
        .long("chdir")
        .takes_value(true)
        .value_name("DIR")
        .help("terraform working directory")
}

fn snapshot_arg() -> Arg<'static> {
    Arg::new("snapshot")
        .short('s')
        .long("snapshot")
        .takes_value(true)
        .value_name("FILE")
        .conflicts_with("chdir")
        .help("read outputs from a materialized snapshot instead of terraform")
}
