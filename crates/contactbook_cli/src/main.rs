//! Command-line shell over `contactbook_core`.
//!
//! # Responsibility
//! - Map subcommands onto `ContactBook` calls.
//! - Flush queued mutations before exit and surface their failures.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use contactbook_core::{
    BookConfig, ContactBook, ContactDraft, MutationFailure, SectionedEntry, Subscription,
};
use log::info;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Sectioned contact book")]
struct Opts {
    /// JSON config file; `--db` overrides its `database`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database file. Without one the book lives in memory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core health and version
    Ping,
    /// Print the sectioned contact list
    List {
        /// Case-insensitive name filter
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Print groups with their members
    Groups,
    /// Create a group
    AddGroup { name: String },
    /// Add a contact
    Add {
        name: String,
        phone: String,
        #[arg(long)]
        email: Option<String>,
        /// Group name; must already exist
        #[arg(long)]
        group: Option<String>,
    },
    /// Delete a group and every contact in it
    DeleteGroup { name: String },
    /// Write contacts one JSON object per line
    Export {
        /// Output file; stdout when omitted
        path: Option<PathBuf>,
    },
    /// Add contacts from an export file
    Import { path: PathBuf },
}

fn main() {
    let opts = Opts::parse();
    if let Err(err) = run(opts) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(opts: Opts) -> anyhow::Result<()> {
    if let Command::Ping = opts.command {
        println!("contactbook_core ping={}", contactbook_core::ping());
        println!("contactbook_core version={}", contactbook_core::core_version());
        return Ok(());
    }

    let mut config = match &opts.config {
        Some(path) => BookConfig::load(path)?,
        None => BookConfig::default(),
    };
    if let Some(db) = opts.db {
        config.database = Some(db);
    }
    let book = ContactBook::open(&config).context("failed to open contact book")?;
    let failures = book.subscribe_failures();

    match opts.command {
        Command::Ping => {}
        Command::List { query } => print_sections(&book.sections(&query)?),
        Command::Groups => {
            for section in book.group_listing()? {
                println!("{} ({})", section.group.name, section.contacts.len());
                for contact in section.contacts {
                    println!("  {}  {}", contact.name, contact.phone);
                }
            }
        }
        Command::AddGroup { name } => book.insert_group(&name)?,
        Command::Add {
            name,
            phone,
            email,
            group,
        } => {
            let mut draft = ContactDraft::new(name, phone);
            if let Some(email) = email {
                draft = draft.with_email(email);
            }
            if let Some(group) = group {
                let found = book
                    .find_group_by_name(group.trim())?
                    .ok_or_else(|| anyhow!("no group named `{group}`"))?;
                draft = draft.with_group(found.id);
            }
            book.insert_contact(draft)?;
        }
        Command::DeleteGroup { name } => {
            let group = book
                .find_group_by_name(name.trim())?
                .ok_or_else(|| anyhow!("no group named `{name}`"))?;
            book.delete_group(group.id)?;
        }
        Command::Export { path } => {
            let written = match path {
                Some(path) => book.export_contacts(
                    File::create(&path)
                        .with_context(|| format!("cannot create `{}`", path.display()))?,
                )?,
                None => book.export_contacts(io::stdout().lock())?,
            };
            eprintln!("exported {written} contact(s)");
        }
        Command::Import { path } => {
            let file =
                File::open(&path).with_context(|| format!("cannot open `{}`", path.display()))?;
            let report = book.import_contacts(BufReader::new(file))?;
            for failure in &report.failures {
                eprintln!("line {}: {}", failure.line, failure.message);
            }
            eprintln!("queued {} contact(s)", report.drafts.len());
        }
    }

    book.flush()?;
    info!("event=cli_command module=cli status=ok");
    report_failures(&failures)
}

fn print_sections(entries: &[SectionedEntry]) {
    for entry in entries {
        match entry {
            SectionedEntry::Header(glyph) => println!("{glyph}"),
            SectionedEntry::Contact(contact) => match &contact.group_name {
                Some(group) => println!("  {}  {}  [{group}]", contact.name, contact.phone),
                None => println!("  {}  {}", contact.name, contact.phone),
            },
        }
    }
}

fn report_failures(failures: &Subscription<MutationFailure>) -> anyhow::Result<()> {
    let mut count = 0;
    while let Some(failure) = failures.try_recv() {
        eprintln!(
            "{} {} failed ({}): {}",
            failure.kind, failure.operation, failure.code, failure.message
        );
        count += 1;
    }
    if count > 0 {
        bail!("{count} queued change(s) were not applied");
    }
    Ok(())
}
