use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use nfcbridge_host::{Event, Outbound};
use nfcbridge_reader::ReaderInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReaderRow<'a> {
    index: usize,
    name: &'a str,
}

#[derive(Serialize)]
struct ReaderListOutput<'a> {
    readers: Vec<ReaderRow<'a>>,
    count: usize,
}

pub fn print_readers(readers: &[ReaderInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReaderListOutput {
                readers: readers
                    .iter()
                    .map(|reader| ReaderRow {
                        index: reader.index,
                        name: &reader.name,
                    })
                    .collect(),
                count: readers.len(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "READER"]);
            for reader in readers {
                table.add_row(vec![reader.index.to_string(), reader.name.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Found {} reader(s):", readers.len());
            for reader in readers {
                println!("  [{}] {}", reader.index, reader.name);
            }
        }
    }
}

pub fn print_no_reader_hints() {
    eprintln!("No NFC readers detected.");
    eprintln!("Troubleshooting:");
    eprintln!("  - Make sure the reader is connected via USB");
    eprintln!("  - Install the reader driver if the vendor ships one");
    eprintln!("  - Linux: make sure pcscd is running (systemctl status pcscd)");
    eprintln!("  - Try unplugging the reader and plugging it back in");
}

/// Prints watch loop events to the console instead of a framed stream.
pub struct ConsoleOutbound {
    format: OutputFormat,
}

impl ConsoleOutbound {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Outbound for ConsoleOutbound {
    fn send_event(&self, event: &Event) -> nfcbridge_host::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
            OutputFormat::Table | OutputFormat::Pretty => match event {
                Event::CardDetected { uid, uid_type } => {
                    println!("Card detected - UID: {uid} ({uid_type})");
                }
                Event::Error { error } => eprintln!("{error}"),
            },
        }
        Ok(())
    }
}
