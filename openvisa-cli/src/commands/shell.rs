//! Interactive VISA shell
//!
//! A small read-eval loop over stdin: list resources, open one, poke
//! its attributes, close it. Command failures are printed and the loop
//! keeps going; only `exit` or end of input leaves the shell.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use openvisa_backend::SimBackend;
use openvisa_core::AttrValue;
use openvisa_manager::{OpenOptions, Resource, ResourceManager};

const ATTRIBUTES: [&str; 5] = [
    "timeout",
    "access_mode",
    "read_termination",
    "write_termination",
    "chunk_size",
];

struct Shell {
    rm: Arc<ResourceManager>,
    current: Option<Arc<Resource>>,
    last_list: Vec<String>,
}

pub async fn execute(backend: Arc<SimBackend>) -> Result<()> {
    let rm = ResourceManager::acquire(backend)
        .await
        .context("Failed to acquire resource manager")?;
    let mut shell = Shell {
        rm,
        current: None,
        last_list: Vec::new(),
    };

    println!("Welcome to the VISA shell. Type 'help' to list commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("(visa) ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        let result = match command {
            "help" | "?" => {
                print_help();
                Ok(())
            }
            "list" => shell.list().await,
            "open" => shell.open(&args).await,
            "close" => shell.close().await,
            "attr" => shell.attr(&args).await,
            "exit" | "quit" => break,
            unknown => {
                println!("Unknown command '{unknown}'. Type 'help' to list commands.");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{e}");
        }
    }

    if let Some(resource) = shell.current.take() {
        resource.close().await.ok();
    }
    shell.rm.close().await.context("Failed to close resource manager")?;

    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!("  list               List available resources");
    println!("  open <name|index>  Open a resource by name or list index");
    println!("  close              Close the open resource");
    println!("  attr [name] [val]  Show, read, or set attributes");
    println!("  exit               Leave the shell");
}

impl Shell {
    async fn list(&mut self) -> Result<()> {
        let infos = self.rm.list_resources_info(Some("?*")).await?;

        self.last_list = infos.keys().cloned().collect();
        self.last_list.sort();

        for (index, name) in self.last_list.iter().enumerate() {
            match infos.get(name).and_then(|info| info.alias.as_deref()) {
                Some(alias) => println!("({index:2}) {name} ({alias})"),
                None => println!("({index:2}) {name}"),
            }
        }
        if self.last_list.is_empty() {
            println!("No resources found");
        }

        Ok(())
    }

    async fn open(&mut self, args: &[&str]) -> Result<()> {
        if self.current.is_some() {
            println!("There is a session already open. Close it before opening a new one.");
            return Ok(());
        }
        let Some(target) = args.first() else {
            println!("Usage: open <name|index>");
            return Ok(());
        };

        // A bare number refers to the last printed list.
        let name = match target.parse::<usize>() {
            Ok(index) => match self.last_list.get(index) {
                Some(name) => name.clone(),
                None => {
                    println!("Not a valid resource index: {index}. Run 'list' first.");
                    return Ok(());
                }
            },
            Err(_) => (*target).to_string(),
        };

        let resource = self.rm.open_resource(&name, OpenOptions::new()).await?;
        println!("{resource} has been opened.");
        self.current = Some(resource);

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        match self.current.take() {
            Some(resource) => {
                resource.close().await?;
                println!("The resource has been closed.");
            }
            None => println!("There are no resources in use."),
        }

        Ok(())
    }

    async fn attr(&mut self, args: &[&str]) -> Result<()> {
        let Some(resource) = &self.current else {
            println!("There are no resources in use. Open one first.");
            return Ok(());
        };

        match args {
            [] => {
                for attribute in ATTRIBUTES {
                    match resource.get_attribute(attribute) {
                        Ok(value) => println!("{attribute:18} {value:?}"),
                        Err(e) => println!("{attribute:18} ({e})"),
                    }
                }
            }
            [attribute] => {
                let value = resource.get_attribute(attribute)?;
                println!("{value:?}");
            }
            [attribute, value] => {
                resource.set_attribute(attribute, parse_value(value))?;
                println!("Done");
            }
            _ => println!("Usage: attr [name] [value]"),
        }

        Ok(())
    }
}

fn parse_value(raw: &str) -> AttrValue {
    if let Ok(number) = raw.parse::<u64>() {
        AttrValue::UInt(number)
    } else if let Ok(flag) = raw.parse::<bool>() {
        AttrValue::Bool(flag)
    } else {
        AttrValue::from(raw)
    }
}
