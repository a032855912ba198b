//! Line-oriented record-keeping session.
//!
//! Each input line is one command, parsed with clap and run against the
//! session's [`RecordStore`]. A failing command prints its error and the
//! session carries on.

use calf_core::metrics::{age_in_days, average_daily_gain, latest_weight, registration_tag};
use calf_core::report::{write_health_report, write_herd_report};
use calf_core::status::{all_statuses, allowed_statuses};
use calf_core::*;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "session", no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: LineCommand,
}

#[derive(Subcommand)]
enum LineCommand {
    /// Register a newborn calf; an initial health log may follow `--`
    Register {
        /// Birth date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        born: Option<NaiveDate>,

        /// Birth time (HH:MM), the current time if omitted
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,

        /// Mother's ear tag
        #[arg(long, default_value = "")]
        mother: String,

        /// male, female or undetermined
        #[arg(long)]
        sex: Option<Sex>,

        /// Birth weight in kg (configured default if omitted)
        #[arg(long)]
        weight: Option<f64>,

        /// Reference to a captured photo
        #[arg(long)]
        photo: Option<String>,

        /// Navel was not disinfected
        #[arg(long)]
        no_navel: bool,

        /// none, maternal or powder
        #[arg(long, default_value = "maternal")]
        colostrum: String,

        /// Powder volume in ml
        #[arg(long)]
        powder_ml: Option<f64>,

        /// Initial health log: <type> <detail...>
        #[arg(last = true)]
        initial: Vec<String>,
    },

    /// List animals, newest registration first
    List {
        /// Only calves born on this date
        #[arg(long)]
        born: Option<NaiveDate>,

        /// Text contained in the id or mother tag
        #[arg(long)]
        search: Option<String>,

        /// Comma-separated statuses to include
        #[arg(long, value_delimiter = ',')]
        status: Vec<Status>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one animal in detail
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Statuses allowed for an animal (or all statuses)
    Statuses { id: Option<String> },

    /// Change an animal's status
    Status { id: String, status: Status },

    /// Correct an animal's recorded sex
    Sex { id: String, sex: Sex },

    /// Record weaning
    Wean {
        id: String,

        /// Weaning date, today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        weight: f64,
    },

    /// Cancel a recorded weaning
    Unwean { id: String },

    /// Add a periodic weight measurement
    Weigh {
        id: String,

        /// Measurement date, today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        weight: f64,
    },

    /// Set the manually tracked current weight
    CurrentWeight { id: String, weight: f64 },

    /// Set the official traceability number (empty clears it)
    OfficialId {
        id: String,

        #[arg(default_value = "")]
        value: String,
    },

    /// Overwrite health flags without logging
    Flags {
        id: String,

        #[arg(long)]
        feces: Option<FecesState>,

        /// Disease name, optionally followed by (stage); "normal" clears it
        #[arg(long, num_args = 1..)]
        disease: Vec<String>,
    },

    /// Append a health log entry: [--at <when>] <type> <detail...>
    Log {
        id: String,

        /// When it happened (YYYY-MM-DDTHH:MM), now if omitted; goes before the type
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,

        /// vaccine, treatment, feces, disease or note
        kind: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        detail: Vec<String>,
    },

    /// Show an animal's health log, newest first
    Logs { id: String },

    /// List the session's vaccines
    Vaccines,

    /// Add a vaccine to the session's list
    VaccineAdd {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Write a CSV report
    Export { what: ExportKind, path: PathBuf },

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Herd,
    Health,
}

/// Whether the session should keep reading
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    store: RecordStore,
    config: Config,
    fixed_now: Option<NaiveDateTime>,
}

impl Session {
    pub fn new(config: Config, fixed_now: Option<NaiveDateTime>) -> Self {
        Self {
            store: RecordStore::new(&config.herd),
            config,
            fixed_now,
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.fixed_now
            .unwrap_or_else(|| Local::now().naive_local())
    }

    /// Read and execute commands until EOF or `quit`
    pub fn run<R: BufRead>(&mut self, input: R, interactive: bool) -> Result<()> {
        let mut lines = input.lines();
        loop {
            if interactive {
                print!("calfbook> ");
                io::stdout().flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match self.execute(line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => {
                    tracing::debug!("Command failed: {:?}", e);
                    eprintln!("error: {}", e);
                }
            }
        }

        tracing::info!("Session ended with {} animals", self.store.len());
        Ok(())
    }

    /// Parse and run one command line
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let parsed = match Line::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Help output is a clap "error" too
                let rendered = e.render().to_string();
                if e.use_stderr() {
                    eprint!("{}", rendered);
                } else {
                    print!("{}", rendered);
                }
                return Ok(Flow::Continue);
            }
        };

        match parsed.command {
            LineCommand::Register {
                born,
                time,
                mother,
                sex,
                weight,
                photo,
                no_navel,
                colostrum,
                powder_ml,
                initial,
            } => {
                let now = self.now();
                let birth_date = born
                    .unwrap_or_else(|| now.date())
                    .and_time(time.unwrap_or_else(|| now.time()));
                let initial_event = match initial.split_first() {
                    Some((kind, words)) => Some(HealthEvent::parse(kind, words)?),
                    None => None,
                };
                let registration = Registration {
                    birth_date,
                    mother,
                    sex,
                    birth_weight: weight.unwrap_or(self.config.herd.default_birth_weight),
                    photo: photo.map(PhotoRef),
                    navel_disinfected: !no_navel,
                    colostrum: Colostrum::from_parts(&colostrum, powder_ml)?,
                    initial_event,
                };
                let record = self.store.register(registration, now)?;
                println!("✓ Registered {}", record.id);
            }

            LineCommand::List {
                born,
                search,
                status,
                json,
            } => {
                let filter = AnimalFilter {
                    born_on: born,
                    text: search,
                    statuses: status,
                };
                let animals = self.store.list(&filter);
                if json {
                    println!("{}", serde_json::to_string_pretty(&animals)?);
                } else {
                    self.print_list(&animals);
                }
            }

            LineCommand::Show { id, json } => {
                let record = self.store.get(&id)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(record)?);
                } else {
                    self.print_detail(record)?;
                }
            }

            LineCommand::Statuses { id } => {
                let statuses = match id {
                    Some(id) => allowed_statuses(self.store.get(&id)?.sex),
                    None => all_statuses(),
                };
                let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
                println!("{}", names.join(", "));
            }

            LineCommand::Status { id, status } => {
                let record = self.store.update_status(&id, status)?;
                println!("✓ {}: status {}", record.id, record.status);
            }

            LineCommand::Sex { id, sex } => {
                let record = self.store.update_sex(&id, sex)?;
                println!("✓ {}: sex {} (status {})", record.id, record.sex, record.status);
            }

            LineCommand::Wean { id, date, weight } => {
                let date = date.unwrap_or_else(|| self.now().date());
                let record = self.store.record_weaning(&id, date, weight)?;
                println!("✓ {}: weaned on {} at {}kg", record.id, date, weight);
            }

            LineCommand::Unwean { id } => {
                let record = self.store.cancel_weaning(&id)?;
                println!("✓ {}: nursing", record.id);
            }

            LineCommand::Weigh { id, date, weight } => {
                let date = date.unwrap_or_else(|| self.now().date());
                let record = self.store.add_periodic_weight(&id, date, weight)?;
                println!("✓ {}: {}kg on {}", record.id, weight, date);
            }

            LineCommand::CurrentWeight { id, weight } => {
                let record = self.store.set_current_weight(&id, weight)?;
                println!("✓ {}: current weight {}kg", record.id, record.current_weight);
            }

            LineCommand::OfficialId { id, value } => {
                let record = self.store.set_official_id(&id, &value)?;
                match &record.official_id {
                    Some(oid) => println!("✓ {}: official id {}", record.id, oid),
                    None => println!("✓ {}: official id cleared", record.id),
                }
            }

            LineCommand::Flags {
                id,
                feces,
                disease,
            } => {
                let disease = parse_disease_flag(&disease)?;
                let record = self.store.set_health_flags(&id, feces, disease)?;
                println!(
                    "✓ {}: feces {} / disease {}",
                    record.id, record.feces_state, record.disease_status
                );
            }

            LineCommand::Log {
                id,
                at,
                kind,
                detail,
            } => {
                if let Some(option) = detail.iter().find(|w| w.starts_with("--")) {
                    return Err(Error::Validation(format!(
                        "'{}' in log text; options go before the log type",
                        option
                    )));
                }
                let event = HealthEvent::parse(&kind, &detail)?;
                if let HealthEvent::Vaccination { vaccine } = &event {
                    if !self.store.vaccines().contains(vaccine) {
                        tracing::warn!("Vaccine '{}' is not in the session list", vaccine);
                    }
                }
                let at = at.unwrap_or_else(|| self.now());
                let entry = self.store.append_health_log(&id, at, event)?;
                println!(
                    "✓ {}: logged {} at {}",
                    entry.animal_id,
                    entry.event.detail(),
                    entry.timestamp.format("%Y-%m-%d %H:%M")
                );
            }

            LineCommand::Logs { id } => {
                let entries = self.store.health_log_for(&id)?;
                if entries.is_empty() {
                    println!("No health records for {}", id);
                }
                for entry in entries {
                    println!(
                        "  {}  {:<19}  {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.event.kind(),
                        entry.event.detail()
                    );
                }
            }

            LineCommand::Vaccines => {
                for vaccine in self.store.vaccines() {
                    println!("  {}", vaccine);
                }
            }

            LineCommand::VaccineAdd { name } => {
                let name = name.join(" ");
                if self.store.add_vaccine(&name) {
                    println!("✓ Added vaccine {}", name);
                } else {
                    println!("Vaccine '{}' not added (blank or already listed)", name);
                }
            }

            LineCommand::Export { what, path } => {
                let path = self.config.report_path(&path);
                let count = match what {
                    ExportKind::Herd => write_herd_report(
                        &self.store,
                        &path,
                        self.now(),
                        self.config.herd.registration_threshold_days,
                    )?,
                    ExportKind::Health => write_health_report(&self.store, &path)?,
                };
                println!("✓ Exported {} rows to {}", count, path.display());
            }

            LineCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn print_list(&self, animals: &[&AnimalRecord]) {
        println!(
            "Total: {} / matched: {}",
            self.store.len(),
            animals.len()
        );
        if animals.is_empty() {
            println!("No animals match the filter.");
            return;
        }

        let now = self.now();
        let threshold = self.config.herd.registration_threshold_days;
        for record in animals {
            let latest = latest_weight(record);
            println!(
                "  [{}] {} ({} / {}kg)",
                registration_tag(record, now, threshold),
                record.id,
                record.status,
                latest.weight
            );
        }
    }

    fn print_detail(&self, record: &AnimalRecord) -> Result<()> {
        let now = self.now();
        let latest = latest_weight(record);

        println!("{}", record.id);
        println!(
            "  Registration: {} (official id: {})",
            registration_tag(record, now, self.config.herd.registration_threshold_days),
            record.official_id.as_deref().unwrap_or("-")
        );
        println!(
            "  Born: {} ({} days) | Mother: {} | Sex: {}",
            record.birth_date.format("%Y-%m-%d %H:%M"),
            age_in_days(record, now),
            record.mother,
            record.sex
        );
        println!("  Status: {}", record.status);
        println!(
            "  Photo: {}",
            record.photo.as_ref().map_or("none", |p| p.0.as_str())
        );
        println!(
            "  Navel disinfected: {} | Colostrum: {}",
            if record.navel_disinfected { "yes" } else { "no" },
            record.colostrum
        );
        println!(
            "  Birth weight: {}kg | Current weight: {}kg | ADG: {:.3}kg/day",
            record.birth_weight,
            record.current_weight,
            average_daily_gain(record, now)
        );
        println!(
            "  Latest weight: {}kg ({}, {})",
            latest.weight, latest.source, latest.date
        );
        match &record.weaning {
            Some(w) => println!("  Weaning: {} ({}kg)", w.date, w.weight),
            None => println!("  Weaning: nursing"),
        }
        for pw in &record.periodic_weights {
            println!("    weighed {}: {}kg", pw.date, pw.weight);
        }
        println!(
            "  Health: {} / feces: {}",
            record.disease_status, record.feces_state
        );

        let entries = self.store.health_log_for(&record.id)?;
        if !entries.is_empty() {
            println!("  Health log:");
            for entry in entries {
                println!(
                    "    {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.event.detail()
                );
            }
        }
        Ok(())
    }
}

/// Parse `YYYY-MM-DDTHH:MM` (seconds optional)
pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| format!("invalid timestamp '{}', expected YYYY-MM-DDTHH:MM", s))
}

/// Parse `HH:MM` (seconds optional)
fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{}', expected HH:MM", s))
}

/// Disease flag from free words: empty = unchanged, "normal" = cleared
fn parse_disease_flag(words: &[String]) -> Result<Option<DiseaseStatus>> {
    if words.is_empty() {
        return Ok(None);
    }
    if words.len() == 1 && words[0].eq_ignore_ascii_case("normal") {
        return Ok(Some(DiseaseStatus::Normal));
    }
    Ok(HealthEvent::parse("disease", words)?.disease_status())
}
