use chrono::Utc;
use clap::{Parser, Subcommand};
use pma_core::checklist::ReadinessChecklist;
use pma_core::config::CoreConfig;
use pma_core::constants::DEFAULT_DATA_DIR;
use pma_core::patient::{elapsed_label, DispositionKind, TriageStatus};
use pma_core::registry::{AdmissionFacts, StructuredIntake, TriageRegistry};
use pma_core::report::HandoverReportBuilder;
use pma_core::store::FileStore;
use pma_core::{ActorName, BibNumber, RecordId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pma")]
#[command(about = "Advanced medical post: mass-casualty intake and readiness CLI")]
struct Cli {
    /// Operator display name recorded in audit entries (or PMA_ACTOR)
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Data directory for the post's store (or PMA_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Checklist catalogue YAML file (or PMA_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Admit a patient with the minimal quick-intake facts
    Admit {
        /// Bib number
        #[arg(long)]
        bib: Option<String>,
        /// Sector or sub-location where the patient was picked up
        #[arg(long)]
        sector: Option<String>,
        /// Presenting complaint
        #[arg(long, default_value = "")]
        motive: String,
        /// Triage status (critical/ua, delayed/ur, minor/uimp, deceased/dcd, untriaged)
        #[arg(long)]
        status: Option<String>,
        /// First name, if known
        #[arg(long)]
        first_name: Option<String>,
        /// Last name, if known
        #[arg(long)]
        last_name: Option<String>,
        /// Approximate age in years
        #[arg(long)]
        age: Option<u8>,
    },
    /// Admit a patient from a full structured-intake JSON file
    AdmitIntake {
        /// Path to a JSON file with the multi-section intake
        file: PathBuf,
    },
    /// List the roster in urgency order
    List {
        /// Case-insensitive substring match against name, bib and motive
        #[arg(long)]
        search: Option<String>,
        /// Exact triage status filter
        #[arg(long)]
        status: Option<String>,
    },
    /// Overwrite a patient's triage status
    Triage {
        /// Record id
        id: String,
        /// New triage status
        status: String,
    },
    /// Record a disposition: returned to activity or evacuated
    Discharge {
        /// Record id
        id: String,
        /// Disposition (returned/rta or evacuated/evac)
        kind: String,
        /// Evacuation destination
        #[arg(long)]
        destination: Option<String>,
    },
    /// Hard-delete a record (irreversible)
    Remove {
        /// Record id
        id: String,
    },
    /// Print the chronological handover report
    Report,
    /// Field-readiness checklist
    #[command(subcommand)]
    Checklist(ChecklistCommands),
}

#[derive(Subcommand)]
enum ChecklistCommands {
    /// Show all items with their state and completion
    Show,
    /// Toggle one item
    Toggle {
        /// Item label, exactly as in the catalogue
        item: String,
    },
    /// Clear all checked items (the audit log is preserved)
    Reset {
        /// Skip the confirmation step
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let actor = resolve_actor(cli.actor.clone())?;
    let config = resolve_config(&cli)?;
    let store = FileStore::open(config.data_dir())?;

    match cli.command {
        Commands::Admit {
            bib,
            sector,
            motive,
            status,
            first_name,
            last_name,
            age,
        } => {
            let mut registry = TriageRegistry::open(&store, actor)?;
            let facts = AdmissionFacts {
                bib_number: bib.map(BibNumber::new).transpose()?,
                first_name,
                last_name,
                age_years: age,
                sector,
                motive,
                triage_status: status.map(|s| s.parse::<TriageStatus>()).transpose()?,
                ..AdmissionFacts::default()
            };
            let record = registry.admit(facts)?;
            println!(
                "Admitted {} [{}] as {}",
                record.display_name(),
                record.id,
                record.triage_status
            );
        }
        Commands::AdmitIntake { file } => {
            let mut registry = TriageRegistry::open(&store, actor)?;
            let text = std::fs::read_to_string(&file)?;
            let intake: StructuredIntake = serde_json::from_str(&text)?;
            let record = registry.admit_structured(intake)?;
            println!(
                "Admitted {} [{}] as {}",
                record.display_name(),
                record.id,
                record.triage_status
            );
        }
        Commands::List { search, status } => {
            let registry = TriageRegistry::open(&store, actor)?;
            let status = status.map(|s| s.parse::<TriageStatus>()).transpose()?;
            let records = registry.list(search.as_deref(), status);
            if records.is_empty() {
                println!("No patients on the roster.");
            } else {
                let now = Utc::now();
                for record in records {
                    println!(
                        "{:<4} {:<6} {:<24} {:>8}  {}  [{}]",
                        record.triage_status.code(),
                        record
                            .bib_number
                            .as_ref()
                            .map(|b| b.as_str())
                            .unwrap_or("-"),
                        record.display_name(),
                        elapsed_label(record.admitted_at, now),
                        record.motive,
                        record.id
                    );
                }
            }
        }
        Commands::Triage { id, status } => {
            let mut registry = TriageRegistry::open(&store, actor)?;
            let id = RecordId::parse(&id)?;
            let status = status.parse::<TriageStatus>()?;
            registry.re_triage(&id, status)?;
            println!("Re-triaged {} as {}", id, status);
        }
        Commands::Discharge {
            id,
            kind,
            destination,
        } => {
            let mut registry = TriageRegistry::open(&store, actor)?;
            let id = RecordId::parse(&id)?;
            let kind = kind.parse::<DispositionKind>()?;
            registry.discharge(&id, kind, destination)?;
            println!("Recorded disposition for {}: {}", id, kind);
        }
        Commands::Remove { id } => {
            let mut registry = TriageRegistry::open(&store, actor)?;
            let id = RecordId::parse(&id)?;
            registry.remove(&id)?;
            println!("Removed {}", id);
        }
        Commands::Report => {
            let registry = TriageRegistry::open(&store, actor)?;
            let report = HandoverReportBuilder::build(registry.roster(), Utc::now());
            for row in &report.rows {
                println!(
                    "{}  {:<6} {:<24} {:<5} {:<6} {}  |  {}  |  {}",
                    row.time.format("%H:%M"),
                    row.bib.as_deref().unwrap_or("-"),
                    row.name,
                    row.age_years
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    row.triage_status.code(),
                    row.motive,
                    row.care_summary,
                    row.disposition_summary
                );
            }
            let counts = report.footer.counts_by_status;
            println!(
                "Total: {} (UA {}, UR {}, UIMP {}, DCD {}, untriaged {}); evacuations: {}",
                report.footer.total,
                counts.critical,
                counts.delayed,
                counts.minor,
                counts.deceased,
                counts.untriaged,
                report.footer.evacuation_count
            );
        }
        Commands::Checklist(command) => {
            let catalog = config.load_catalog()?;
            let mut checklist = ReadinessChecklist::open(&store, catalog, actor)?;
            match command {
                ChecklistCommands::Show => {
                    let categories = checklist.catalog().categories().to_vec();
                    for category in &categories {
                        println!(
                            "{} ({}%)",
                            category.name,
                            checklist.completion(Some(&category.name))?
                        );
                        for item in &category.items {
                            let mark = if checklist.is_checked(item) { "x" } else { " " };
                            println!("  [{}] {}", mark, item);
                        }
                    }
                    println!("Overall: {}%", checklist.completion(None)?);
                }
                ChecklistCommands::Toggle { item } => {
                    let checked = checklist.toggle(&item)?;
                    let state = if checked { "checked" } else { "unchecked" };
                    println!("{}: {}", item, state);
                }
                ChecklistCommands::Reset { yes } => {
                    let request = checklist.request_reset();
                    if !yes {
                        println!(
                            "Reset would clear {} checked item(s) ({}% complete):",
                            request.checked_items.len(),
                            request.completion_percent
                        );
                        for item in &request.checked_items {
                            println!("  - {}", item);
                        }
                        println!("Re-run with --yes to confirm. The audit log is preserved.");
                    } else {
                        checklist.reset()?;
                        println!("Checklist reset. The audit log is preserved.");
                    }
                }
            }
        }
    }

    Ok(())
}

fn resolve_actor(flag: Option<String>) -> Result<ActorName, Box<dyn std::error::Error>> {
    let name = flag
        .or_else(|| std::env::var("PMA_ACTOR").ok())
        .unwrap_or_else(|| "Duty officer".to_string());
    Ok(ActorName::new(name)?)
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| std::env::var("PMA_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let catalog = cli
        .catalog
        .clone()
        .or_else(|| std::env::var("PMA_CATALOG").ok().map(PathBuf::from));

    Ok(CoreConfig::new(data_dir, catalog)?)
}
