//! AutoFill CLI
//!
//! Checks rule files exported from the extension, shows which rules a URL
//! would trigger and writes the TypeScript definitions of the message types.

use std::fmt::Write as _;
use std::fs;

use clap::{Parser, Subcommand};
use ts_rs::TS;

use af_core::url::{matching_pattern, normalize};
use af_core::{Reply, Rule};
use af_rules::{dedupe_rules, parse_rule_bundle, validate_rules, ImportedRules};

#[derive(Parser)]
#[command(name = "af-cli")]
#[command(about = "AutoFill rule file tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an exported rule file for problems
    Validate {
        /// Rule file (JSON export)
        #[arg(short, long)]
        input: String,
    },

    /// List the rules that would run on a URL
    Match {
        /// Rule file (JSON export)
        #[arg(short, long)]
        input: String,

        /// Page URL
        #[arg(short, long)]
        url: String,
    },

    /// Write TypeScript definitions for the message types
    Types {
        /// Output directory
        #[arg(short, long, default_value = "bindings")]
        out_dir: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Match { input, url } => cmd_match(&input, &url),
        Commands::Types { out_dir } => cmd_types(&out_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_bundle(path: &str) -> Result<ImportedRules, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    parse_rule_bundle(&text).map_err(|e| format!("Invalid rule file '{}': {}", path, e))
}

fn cmd_validate(input: &str) -> Result<(), String> {
    let imported = load_bundle(input)?;
    print!("{}", validation_report(input, imported));
    Ok(())
}

fn cmd_match(input: &str, url: &str) -> Result<(), String> {
    let imported = load_bundle(input)?;
    print!("{}", match_report(&imported.bundle.rules, url));
    Ok(())
}

fn cmd_types(out_dir: &str) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create '{}': {}", out_dir, e))?;
    // Reply pulls in every result type, Command pulls in Rule
    Reply::export_all_to(out_dir).map_err(|e| format!("Failed to export types: {}", e))?;
    af_core::Command::export_all_to(out_dir)
        .map_err(|e| format!("Failed to export types: {}", e))?;

    println!("Wrote TypeScript definitions to '{}'", out_dir);
    Ok(())
}

fn validation_report(input: &str, imported: ImportedRules) -> String {
    let ImportedRules { bundle, skipped } = imported;
    let mut issues: Vec<String> = skipped.iter().map(ToString::to_string).collect();
    issues.extend(validate_rules(&bundle.rules).iter().map(ToString::to_string));
    let mut rules = bundle.rules;
    let stats = dedupe_rules(&mut rules);

    let mut out = String::new();
    let _ = writeln!(out, "Rule file: {}", input);
    let _ = writeln!(out, "  Version:     {}", bundle.version.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Exported at: {}", bundle.exported_at.as_deref().unwrap_or("-"));
    let _ = writeln!(
        out,
        "  Rules:       {} -> {} (dedupe removed {}, unreadable {})",
        stats.before,
        stats.after,
        stats.deduped,
        skipped.len()
    );

    if issues.is_empty() {
        let _ = writeln!(out, "No issues found");
    } else {
        let _ = writeln!(out, "Issues ({}):", issues.len());
        for issue in &issues {
            let _ = writeln!(out, "  {}", issue);
        }
    }
    out
}

fn match_report(rules: &[Rule], url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "URL: {}", normalize(url));

    let mut matched = 0usize;
    for rule in rules {
        if let Some(pattern) = matching_pattern(rule, url) {
            matched += 1;
            let _ = writeln!(
                out,
                "  {} [{}] {} <- {}",
                rule.id,
                rule.selector_type.as_str(),
                rule.selector,
                pattern
            );
        }
    }

    let _ = writeln!(out, "{} of {} rule(s) match", matched, rules.len());
    out
}
