//! Command-line enrichment of one lead or a JSON file of leads.
//!
//! ```text
//! enrich-lead "MARISTELA MODA PET" --phone 4833655751 --email contato@example.com
//! enrich-lead --file leads.json
//! ```

use lead_enrichment_api::config::Config;
use lead_enrichment_api::models::{BatchStats, LeadInput};
use lead_enrichment_api::LeadEnrichmentService;
use std::env;

const USAGE: &str = "usage: enrich-lead <company name> [--phone PHONE] [--email EMAIL]\n       enrich-lead --file LEADS.json";

enum Command {
    Single(LeadInput),
    Batch(String),
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value\n{}", flag, USAGE))
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut company: Option<String> = None;
    let mut phone: Option<String> = None;
    let mut email: Option<String> = None;
    let mut file: Option<String> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--phone" => phone = Some(flag_value(&mut iter, arg)?),
            "--email" => email = Some(flag_value(&mut iter, arg)?),
            "--file" => file = Some(flag_value(&mut iter, arg)?),
            "-h" | "--help" => anyhow::bail!(USAGE),
            other if company.is_none() => company = Some(other.to_string()),
            other => anyhow::bail!("unexpected argument '{}'\n{}", other, USAGE),
        }
    }

    if let Some(path) = file {
        return Ok(Command::Batch(path));
    }

    let company = company.ok_or_else(|| anyhow::anyhow!(USAGE))?;
    let mut lead = LeadInput::new(company);
    if let Some(phone) = phone {
        lead = lead.with_phone(phone);
    }
    if let Some(email) = email {
        lead = lead.with_email(email);
    }
    Ok(Command::Single(lead))
}

/// Main entry point for the enrichment CLI.
///
/// Results are printed to stdout as JSON; logs go to stderr.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lead_enrichment_api::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config = Config::from_env()?;
    let service = LeadEnrichmentService::from_config(&config)?;

    match command {
        Command::Single(lead) => match service.try_enrich(&lead).await {
            Ok(enriched) => {
                println!("{}", serde_json::to_string_pretty(&enriched)?);
            }
            Err(e) => {
                eprintln!("✗ Lead not enriched: {}", e);
                std::process::exit(1);
            }
        },
        Command::Batch(path) => {
            let content = tokio::fs::read_to_string(&path).await?;
            let leads: Vec<serde_json::Value> = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("{} must contain a JSON array of leads: {}", path, e))?;

            let results = service.enrich_many(leads).await;
            let stats = BatchStats::from_results(&results);
            println!("{}", serde_json::to_string_pretty(&results)?);

            eprintln!("=== Batch Enrichment Complete ===");
            eprintln!("Total processed: {}", stats.total);
            eprintln!("✓ Success: {}", stats.successful);
            eprintln!("✗ Failed: {}", stats.failed);
            if stats.total > 0 {
                eprintln!(
                    "Success rate: {:.1}%",
                    (stats.successful as f64 / stats.total as f64) * 100.0
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_lead_args() {
        match parse_args(&args(&["Acme Pet", "--phone", "4833655751"])).unwrap() {
            Command::Single(lead) => {
                assert_eq!(lead.company_name, "Acme Pet");
                assert_eq!(lead.phone.as_deref(), Some("4833655751"));
                assert_eq!(lead.email, None);
            }
            Command::Batch(_) => panic!("expected single lead"),
        }
    }

    #[test]
    fn test_file_args() {
        assert!(matches!(
            parse_args(&args(&["--file", "leads.json"])).unwrap(),
            Command::Batch(path) if path == "leads.json"
        ));
    }

    #[test]
    fn test_missing_company_is_usage_error() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["a", "b"])).is_err());
    }

    #[test]
    fn test_flag_without_value_is_usage_error() {
        for list in [&["Acme", "--phone"][..], &["Acme", "--email"][..], &["--file"][..]] {
            let err = parse_args(&args(list)).err().unwrap();
            assert!(err.to_string().contains("requires a value"));
        }
    }
}
