//! threat-scorer: score NDJSON activity events and print one classification per line.
//!
//! Usage: `threat-scorer [INPUT|-] [24h|7d|30d]`. Input defaults to stdin; when a
//! timeframe is given a threat report for it is printed after the classifications.

use std::io::{BufRead, BufReader, Write};
use threat_scorer::{
    activity::Activity,
    config::ScorerConfig,
    logging::StructuredLogger,
    report::Timeframe,
    risk::{RiskLevel, RiskScorer},
    storage::SecureStore,
};
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn open_input(arg: Option<&str>) -> Result<Box<dyn BufRead>, BoxError> {
    match arg {
        None | Some("-") => Ok(Box::new(BufReader::new(std::io::stdin()))),
        Some(path) => Ok(Box::new(BufReader::new(std::fs::File::open(path)?))),
    }
}

fn score_stream(
    scorer: &RiskScorer,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(usize, usize), BoxError> {
    let (mut scored, mut skipped) = (0usize, 0usize);
    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let activity = match Activity::from_json(&line) {
            Ok(a) => a,
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "skipping malformed activity");
                skipped += 1;
                continue;
            }
        };
        let result = scorer.analyze(&activity);
        if result.level > RiskLevel::Low {
            info!(
                activity_id = %result.activity_id,
                activity_type = %result.activity_type,
                score = result.score,
                level = %result.level,
                "risk result"
            );
        }
        StructuredLogger::emit_json(&result, out)?;
        scored += 1;
    }
    Ok((scored, skipped))
}

fn main() -> Result<(), BoxError> {
    let config_path = std::env::var("THREAT_SCORER_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = ScorerConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let timeframe = args.get(1).map(|s| Timeframe::parse_or_default(s));

    let scorer = RiskScorer::new(&config);
    scorer.initialize();

    let store = if config.store.enabled {
        std::fs::create_dir_all(&config.data_dir)?;
        let secret = std::env::var("THREAT_SCORER_SECRET").unwrap_or_else(|_| {
            warn!("THREAT_SCORER_SECRET not set; using built-in store secret");
            "threat-scorer-local-secret".to_string()
        });
        let store = SecureStore::open(&config.store_path(), secret.as_bytes())?;
        scorer.restore(&store)?;
        Some(store)
    } else {
        None
    };

    let input = open_input(args.first().map(String::as_str))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let (scored, skipped) = score_stream(&scorer, input, &mut out)?;
    info!(scored, skipped, "input processed");

    if let Some(tf) = timeframe {
        let report = scorer.report(tf, chrono::Utc::now());
        StructuredLogger::emit_json(&report, &mut out)?;
    }
    out.flush()?;

    if let Some(store) = &store {
        scorer.save(store)?;
        info!(path = %config.store_path().display(), "state saved");
    }

    Ok(())
}
