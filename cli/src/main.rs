use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use encoding_rs::Encoding;
use engine::{
    parse_roster_json, parse_roster_yaml, run_encounters, Combatant, Dice, EncounterResult,
    RunSummary, DEFAULT_TRIALS,
};

#[derive(Parser)]
#[command(name = "encounter-sim")]
#[command(about = "Monte Carlo simulator for party-vs-monsters encounters")]
struct Args {
    /// Party roster (JSON or YAML)
    party: PathBuf,

    /// Monster roster (JSON or YAML)
    monsters: PathBuf,

    /// Number of encounters to simulate
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: u32,

    /// Directory for battle logs and the summary report
    #[arg(long, default_value = "results")]
    out_dir: PathBuf,

    /// RNG seed (omit for a fresh run each time)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON instead of the text table
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Read a text file, honoring a BOM if an editor left one behind.
fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))
    }
}

fn load_roster_auto(path: &Path) -> Result<Vec<Combatant>> {
    let text = read_text_auto(path)?;
    let roster = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => parse_roster_yaml(&text),
        _ => parse_roster_json(&text),
    }
    .with_context(|| format!("in roster file {}", path.display()))?;
    ensure!(!roster.is_empty(), "roster {} is empty", path.display());
    Ok(roster)
}

fn roster_table(title: &str, roster: &[Combatant]) -> String {
    let mut out = format!("{}\n", title);
    for c in roster {
        out.push_str(&format!(
            "  {:<16} HP {:<4} AC {:<3} init {:+}\n",
            c.name, c.max_hp, c.ac, c.initiative_bonus
        ));
    }
    out
}

fn format_summary(summary: &RunSummary, party: &[Combatant], monsters: &[Combatant]) -> String {
    let mut out = String::new();
    out.push_str("encounter-sim results\n");
    out.push_str("---------------------\n");
    out.push_str(&roster_table("party:", party));
    out.push_str(&roster_table("monsters:", monsters));
    out.push('\n');
    out.push_str(&format!("trials:        {}\n", summary.trials));
    out.push_str(&format!(
        "party wins:    {}  ({:.1}%)\n",
        summary.party_wins,
        summary.percent(summary.party_wins)
    ));
    out.push_str(&format!(
        "monster wins:  {}  ({:.1}%)\n",
        summary.monster_wins,
        summary.percent(summary.monster_wins)
    ));
    out.push_str(&format!(
        "draws:         {}  ({:.1}%)\n",
        summary.draws,
        summary.percent(summary.draws)
    ));
    out.push('\n');
    out.push_str("average remaining HP (all trials):\n");
    out.push_str(&format!("  party:    {:.2}\n", summary.avg_party_hp));
    out.push_str(&format!("  monsters: {:.2}\n", summary.avg_monster_hp));
    out.push_str(&format!("\nduration:      {:.2}s\n", summary.seconds));
    out
}

fn write_battle_log(logs_dir: &Path, index: u32, result: &EncounterResult) -> Result<()> {
    let path = logs_dir.join(format!(
        "battle_{:03}_{}.txt",
        index,
        result.outcome.as_str()
    ));
    fs::write(&path, result.log.join("\n"))
        .with_context(|| format!("failed to write {}", path.display()))
}

fn write_report(
    out_dir: &Path,
    party_file: &Path,
    monster_file: &Path,
    summary_text: &str,
) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let path = out_dir.join(format!("encounter_{}.txt", timestamp));
    let mut text = String::new();
    text.push_str("Encounter Simulation Report\n");
    text.push_str(&"=".repeat(50));
    text.push('\n');
    text.push_str(&format!("party file:   {}\n", party_file.display()));
    text.push_str(&format!("monster file: {}\n\n", monster_file.display()));
    text.push_str(summary_text);
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut party = load_roster_auto(&args.party)?;
    let mut monsters = load_roster_auto(&args.monsters)?;

    let logs_dir = args.out_dir.join("logs");
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;

    let mut dice = match args.seed {
        Some(seed) => Dice::from_seed(seed),
        None => Dice::from_entropy(),
    };

    tracing::info!(trials = args.trials, "running simulations");

    let mut log_error: Option<anyhow::Error> = None;
    let summary = run_encounters(
        &mut party,
        &mut monsters,
        args.trials,
        &mut dice,
        |i, result| {
            if log_error.is_none() {
                if let Err(e) = write_battle_log(&logs_dir, i, result) {
                    log_error = Some(e);
                }
            }
        },
    )?;
    if let Some(e) = log_error {
        return Err(e);
    }

    let text = format_summary(&summary, &party, &monsters);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", text);
    }

    let report_path = write_report(&args.out_dir, &args.party, &args.monsters, &text)?;
    println!("\nreport saved to {}", report_path.display());
    Ok(())
}
