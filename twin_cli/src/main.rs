use twin_core::*;
use twin_core::knowledge::{caffeine_genotypes, default_user};
use twin_core::summary::TimelineSummary;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "biotwin")]
#[command(about = "Pharmacokinetic digital twin simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Caffeine clearance curve for one dose
    Clearance {
        /// Dose in mg
        #[arg(long)]
        dose: f64,

        /// Body weight in kg
        #[arg(long)]
        weight: f64,

        /// CYP1A2 rs762551 genotype (AA, AC, CC)
        #[arg(long)]
        genotype: String,

        /// Dose time as HH:MM
        #[arg(long, default_value = "08:00")]
        time: String,

        /// Write the curve to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate a day of stacked doses
    Stack {
        /// JSON list of {substance, doseMg, time}
        #[arg(long)]
        file: PathBuf,

        /// Body weight in kg
        #[arg(long)]
        weight: Option<f64>,

        /// Genetic marker as rsID=GENOTYPE (repeatable)
        #[arg(long = "genetics", value_parser = parse_marker)]
        genetics: Vec<(String, String)>,

        /// Write the timeline to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project long-term health under constant daily habits
    Prognosis {
        #[arg(long, default_value_t = 95.0)]
        liver: f64,

        #[arg(long, default_value_t = 85.0)]
        neuro: f64,

        #[arg(long, default_value_t = 90.0)]
        cardio: f64,

        /// Daily caffeine in mg
        #[arg(long, default_value_t = 0.0)]
        caffeine: f64,

        /// Daily alcohol units
        #[arg(long, default_value_t = 0.0)]
        alcohol: f64,

        /// Average nightly sleep in hours
        #[arg(long, default_value_t = 0.0)]
        sleep: f64,

        /// Forecast horizon (defaults to config)
        #[arg(long)]
        years: Option<u32>,

        /// Write checkpoints to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate intake logs into daily habits
    Habits {
        /// JSON list of {date, substance, doseMg}
        #[arg(long)]
        file: PathBuf,

        /// Average nightly sleep in hours
        #[arg(long, default_value_t = 0.0)]
        sleep: f64,
    },

    /// List the built-in substances (default)
    Substances,
}

fn main() -> Result<()> {
    twin_core::logging::init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!("Using config: {:?}", config);

    match cli.command {
        Some(Commands::Clearance {
            dose,
            weight,
            genotype,
            time,
            csv,
            json,
        }) => cmd_clearance(dose, weight, genotype, time, csv.as_deref(), json, &config),
        Some(Commands::Stack {
            file,
            weight,
            genetics,
            csv,
            json,
        }) => cmd_stack(&file, weight, genetics, csv.as_deref(), json, &config),
        Some(Commands::Prognosis {
            liver,
            neuro,
            cardio,
            caffeine,
            alcohol,
            sleep,
            years,
            csv,
            json,
        }) => {
            let start = HealthState {
                liver_health: liver,
                neuro_health: neuro,
                cardio_health: cardio,
            };
            let habits = HabitInput {
                caffeine_mg: caffeine,
                alcohol_units: alcohol,
                avg_sleep_hours: sleep,
            };
            let years = years
                .unwrap_or(config.prognosis.default_years)
                .min(config.prognosis.max_years);
            cmd_prognosis(start, habits, years, csv.as_deref(), json, &config)
        }
        Some(Commands::Habits { file, sleep }) => cmd_habits(&file, sleep),
        Some(Commands::Substances) | None => cmd_substances(),
    }
}

fn parse_marker(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, genotype)) if !id.trim().is_empty() && !genotype.trim().is_empty() => {
            Ok((id.trim().to_string(), genotype.trim().to_string()))
        }
        _ => Err(format!("expected rsID=GENOTYPE, got {:?}", s)),
    }
}

fn load_knowledge() -> Result<&'static KnowledgeBase> {
    let knowledge = get_default_knowledge();
    let errors = knowledge.validate();
    if !errors.is_empty() {
        eprintln!("Knowledge base validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::KnowledgeValidation("Invalid knowledge base".into()));
    }
    Ok(knowledge)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_clearance(
    dose: f64,
    weight: f64,
    genotype: String,
    time: String,
    csv: Option<&Path>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let request = ClearanceRequest {
        dose_mg: dose,
        weight_kg: weight,
        genotype,
        start: time,
    };
    let report = calculate_clearance(&request, &caffeine_genotypes(), &config.clearance)?;

    if let Some(path) = csv {
        twin_core::export::write_curve_file(path, &report.curve)?;
    }

    if json {
        return print_json(&report);
    }

    display_header("CAFFEINE CLEARANCE");
    println!("  Phenotype:  {}", report.phenotype_label);
    println!("  Half-life:  {}h", report.half_life_hours);
    println!(
        "  Crash time: {}",
        report.crash_time.label(config.clearance.horizon_hours)
    );
    if !report.recommendation.is_empty() {
        println!("  ℹ {}", report.recommendation);
    }
    println!();

    for point in &report.curve {
        println!(
            "  {:>2}h  {:>8}  {:>8.2} mg  {:?}",
            point.hour_offset, point.label, point.remaining_mg, point.status
        );
    }

    if let Some(path) = csv {
        println!("\n✓ Curve written to {}", path.display());
    }

    Ok(())
}

fn cmd_stack(
    file: &Path,
    weight: Option<f64>,
    genetics: Vec<(String, String)>,
    csv: Option<&Path>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let knowledge = load_knowledge()?;
    let entries: Vec<StackEntry> = read_json(file)?;

    let mut user = default_user();
    if let Some(w) = weight {
        if !(w.is_finite() && w > 0.0) {
            return Err(Error::InvalidBodyWeight(format!("{}", w)));
        }
        user.weight_kg = w;
    }
    user.genetics.extend(genetics);

    let enriched = knowledge.enrich_stack(&entries, &user);
    let report = simulate_stack(&enriched.entries, &enriched.profiles, config);
    let summary = summarize(&report.timeline, &config.summary);

    if let Some(path) = csv {
        twin_core::export::write_timeline_file(path, &report.timeline)?;
    }

    if json {
        #[derive(serde::Serialize)]
        struct StackOutput<'a> {
            #[serde(flatten)]
            report: &'a StackReport,
            summary: &'a TimelineSummary,
        }
        return print_json(&StackOutput {
            report: &report,
            summary: &summary,
        });
    }

    display_header("STACK SIMULATION");
    println!(
        "  Processed {} of {} entries",
        report.processed_count, report.input_count
    );
    for skipped in &report.skipped {
        println!("  ✗ #{} {}: {}", skipped.index, skipped.substance, skipped.reason);
    }
    println!();
    println!("  Neuro: {} (late {:.2}, peak {:.2})", summary.neuro_status, summary.late_neuro, summary.peak_neuro);
    println!("  Detox: {} (peak {:.2})", summary.detox_status, summary.peak_detox);
    println!();

    for slot in report.timeline.iter().filter(|s| !s.per_substance_mg.is_empty()) {
        let substances: Vec<String> = slot
            .per_substance_mg
            .iter()
            .map(|(name, mg)| format!("{} {:.2}mg", name, mg))
            .collect();
        println!("  {:>8}  {}", slot.label, substances.join(", "));
    }

    display_risks(&report.risks);

    if let Some(path) = csv {
        println!("\n✓ Timeline written to {}", path.display());
    }

    Ok(())
}

fn cmd_prognosis(
    start: HealthState,
    habits: HabitInput,
    years: u32,
    csv: Option<&Path>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let report = project_health_from_today(start, &habits, years, config);

    if let Some(path) = csv {
        twin_core::export::write_checkpoints_file(path, &report.checkpoints)?;
    }

    if json {
        return print_json(&report);
    }

    display_header("HEALTH PROGNOSIS");
    println!("  {} year forecast, {} checkpoints", years, report.checkpoints.len());
    println!();

    // One line per forecast year
    let mut last_year = 0;
    for checkpoint in &report.checkpoints {
        if checkpoint.year == last_year {
            continue;
        }
        last_year = checkpoint.year;
        println!(
            "  Year {}  {}  liver {:>5.1}  neuro {:>5.1}  cardio {:>5.1}",
            checkpoint.year,
            checkpoint.date,
            checkpoint.liver_health,
            checkpoint.neuro_health,
            checkpoint.cardio_health
        );
    }

    let end = report.final_state;
    println!();
    println!(
        "  Final: liver {:.1}  neuro {:.1}  cardio {:.1}",
        end.liver_health, end.neuro_health, end.cardio_health
    );

    display_risks(&report.risks);

    if let Some(path) = csv {
        println!("\n✓ Checkpoints written to {}", path.display());
    }

    Ok(())
}

fn cmd_habits(file: &Path, sleep: f64) -> Result<()> {
    let knowledge = load_knowledge()?;
    let logs: Vec<IntakeLog> = read_json(file)?;
    let habits = habits_from_logs(&logs, knowledge, sleep);
    print_json(&habits)
}

fn cmd_substances() -> Result<()> {
    let knowledge = load_knowledge()?;

    display_header("SUBSTANCES");
    for profile in knowledge.substances.values() {
        let table = &profile.genotypes;
        println!(
            "  {} ({:?}, {} {})",
            profile.name, profile.class, table.gene, table.variant_id
        );
        for (genotype, phenotype) in &table.genotypes {
            let half_life = phenotype
                .half_life_hours
                .map(|h| format!("{}h", h))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "    {:<3} {:<18} half-life {}",
                genotype, phenotype.phenotype_label, half_life
            );
        }
    }

    if !knowledge.aliases.is_empty() {
        println!();
        for (alias, target) in &knowledge.aliases {
            println!("  {} → {}", alias, target);
        }
    }
    println!();

    Ok(())
}

fn display_header(title: &str) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", title);
    println!("╰─────────────────────────────────────────╯");
    println!();
}

fn display_risks(risks: &[RiskEvent]) {
    println!();
    if risks.is_empty() {
        println!("  No significant risks detected.");
        return;
    }
    for risk in risks {
        println!(
            "  ⚠ {} [{:?}] at {}: {}",
            risk.kind, risk.severity, risk.time_label, risk.message
        );
    }
}
