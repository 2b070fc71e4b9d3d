use anyhow::Context;
use clap::{Parser, Subcommand};
use hms_core::config::data_dir_from_env_value;
use hms_core::constants::DISCHARGE_SUMMARY_DIR_NAME;
use hms_core::repositories::wire;
use hms_core::{DischargeSummaryStore, YamlFileStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "HMS discharge summary store CLI")]
struct Cli {
    /// Data directory (defaults to HMS_DATA_DIR, then `hms_data`)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the discharge summaries of a hospital
    List {
        /// Hospital id
        hospital_id: String,
    },
    /// Print one discharge summary as YAML
    Show {
        /// Hospital id
        hospital_id: String,
        /// Discharge summary id
        id: String,
    },
    /// Import a discharge summary from a YAML file
    Import {
        /// Path to the YAML record
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("HMS_DATA_DIR").ok()));
    let store = YamlFileStore::new(data_dir.join(DISCHARGE_SUMMARY_DIR_NAME));

    match cli.command {
        Some(Commands::List { hospital_id }) => {
            let records = store.list(&hospital_id)?;
            if records.is_empty() {
                println!("No discharge summaries found.");
            } else {
                for record in records {
                    println!(
                        "ID: {}, Diagnosis: {}, Payment: {}, Updated: {}",
                        record.id, record.final_diagnosis, record.payment_type, record.updated_at
                    );
                }
            }
        }
        Some(Commands::Show { hospital_id, id }) => match store.find(&id, &hospital_id)? {
            Some(record) => print!("{}", wire::render(&record)?),
            None => eprintln!("No discharge summary {} for hospital {}", id, hospital_id),
        },
        Some(Commands::Import { file }) => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let record = wire::parse(&text)?;
            let (id, hospital_id) = (record.id.to_string(), record.hospital_id.to_string());
            store.insert(record)?;
            println!("Imported discharge summary {} for hospital {}", id, hospital_id);
        }
        None => {
            println!("Use --help to see available commands");
        }
    }
    Ok(())
}
