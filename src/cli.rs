//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http_fund_source::HttpFundSource;
use crate::adapters::yahoo_adapter::YahooAdapter;
use crate::domain::config_validation::{
    data_settings, etf_map_from_config, fetch_plan_from_config, fetch_settings, validate_config,
    DEFAULT_VOLATILITY_SYMBOL,
};
use crate::domain::error::FundScoreError;
use crate::domain::fetch::{run_fetch, storage_key, FetchReport};
use crate::domain::scorer::{ScoreCard, Scorer, MAX_SCORE};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::FundSourcePort;

#[derive(Parser, Debug)]
#[command(name = "fundscore", about = "Technical buy score for mutual funds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download ETF, volatility index and fund history into the data store
    Fetch {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Skip the fund table download
        #[arg(long)]
        skip_funds: bool,
    },
    /// Score one fund, or every fund in the table
    Score {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
        /// Score as of this date (YYYY-MM-DD) instead of each fund's latest data
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Show each signal's contribution
        #[arg(long)]
        detail: bool,
    },
    /// List funds in the table with their mapped ETF and data range
    Funds {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Fetch { config, skip_funds } => run_fetch_command(config.as_ref(), skip_funds),
        Command::Score {
            config,
            code,
            as_of,
            detail,
        } => run_score(config.as_ref(), code.as_deref(), as_of, detail),
        Command::Funds { config } => run_funds(config.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &FundScoreError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FundScoreError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        fail(&err)
    })
}

/// Loads and validates the config at `path`, or an empty one with defaults.
pub fn resolve_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let config = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_config(&config).map_err(|e| fail(&e))?;
    Ok(config)
}

pub fn build_store(config: &dyn ConfigPort) -> Result<CsvStore, FundScoreError> {
    let data = data_settings(config)?;
    Ok(CsvStore::new(
        PathBuf::from(data.base_path),
        &data.fund_table,
        &data.etf_dir,
    ))
}

/// Storage key of the configured volatility index.
pub fn volatility_key(config: &dyn ConfigPort) -> String {
    let symbol = config
        .get_string("fetch", "volatility_symbol")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VOLATILITY_SYMBOL.to_string());
    storage_key(&symbol)
}

pub fn build_scorer(config: &dyn ConfigPort) -> Result<Scorer, FundScoreError> {
    let store = build_store(config)?;
    let etf_map = etf_map_from_config(config)?;
    Scorer::load(&store, etf_map, &volatility_key(config))
}

/// Score cards for `code`, or for every fund, highest score first.
///
/// Without `as_of`, each fund is scored at its latest observation and funds
/// with no observations are skipped.
pub fn score_funds(
    scorer: &Scorer,
    code: Option<&str>,
    as_of: Option<NaiveDate>,
) -> Result<Vec<ScoreCard>, FundScoreError> {
    let codes: Vec<String> = match code {
        Some(c) => vec![c.trim().to_uppercase()],
        None => scorer.fund_codes().into_iter().map(str::to_string).collect(),
    };

    let mut cards = Vec::with_capacity(codes.len());
    for code in &codes {
        let date = match as_of {
            Some(d) => Some(d),
            None => scorer.latest_date(code)?,
        };
        match date {
            Some(d) => cards.push(scorer.score_card(code, d)?),
            None => eprintln!("Skipping {code}: no observations"),
        }
    }

    cards.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.code.cmp(&b.code)));
    Ok(cards)
}

pub fn format_score_table(cards: &[ScoreCard], detail: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<12} {:<6} {:>7} {:>7}",
        "Code", "As of", "ETF", "Score", "VIX"
    );
    for card in cards {
        let vix = card
            .volatility_index
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<10} {:<12} {:<6} {:>3}/{:<3} {:>7}",
            card.code,
            card.as_of.format("%Y-%m-%d").to_string(),
            card.etf.as_deref().unwrap_or("-"),
            card.total(),
            MAX_SCORE,
            vix
        );
        if detail {
            for (label, earned, max) in card.contributions() {
                let _ = writeln!(out, "    {label:<26} {earned}/{max}");
            }
        }
    }
    out
}

pub fn format_fetch_report(report: &FetchReport) -> String {
    let mut out = String::new();
    for (key, bars) in &report.saved {
        let _ = writeln!(out, "saved   {key:<8} {bars} bars");
    }
    for symbol in &report.empty {
        let _ = writeln!(out, "empty   {symbol}");
    }
    if !report.funds.is_empty() {
        let _ = writeln!(out, "funds   {}", report.funds.join(","));
    }
    if let Some(err) = &report.fund_error {
        let _ = writeln!(out, "funds   failed: {err}");
    }
    out
}

fn run_fetch_command(config_path: Option<&PathBuf>, skip_funds: bool) -> ExitCode {
    let config = match resolve_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = (|| -> Result<FetchReport, FundScoreError> {
        let store = build_store(&config)?;
        let plan = fetch_plan_from_config(&config)?;
        let settings = fetch_settings(&config)?;
        let provider = YahooAdapter::new(&settings.chart_url, settings.timeout_secs)?;
        let fund_source = if skip_funds {
            None
        } else {
            Some(HttpFundSource::new(&settings.fund_url, settings.timeout_secs)?)
        };

        eprintln!(
            "Fetching {} tickers into {}",
            plan.tickers.len() + 1,
            store.fund_table_path().display()
        );
        let fund_source = fund_source.as_ref().map(|s| s as &dyn FundSourcePort);
        run_fetch(&provider, fund_source, &store, &plan)
    })();

    match result {
        Ok(report) => {
            print!("{}", format_fetch_report(&report));
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_score(
    config_path: Option<&PathBuf>,
    code: Option<&str>,
    as_of: Option<NaiveDate>,
    detail: bool,
) -> ExitCode {
    let config = match resolve_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let cards = build_scorer(&config).and_then(|scorer| score_funds(&scorer, code, as_of));
    match cards {
        Ok(cards) if cards.is_empty() => {
            eprintln!("No funds to score");
            ExitCode::SUCCESS
        }
        Ok(cards) => {
            print!("{}", format_score_table(&cards, detail));
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_funds(config_path: Option<&PathBuf>) -> ExitCode {
    let config = match resolve_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let scorer = match build_scorer(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    for code in scorer.fund_codes() {
        let etf = scorer.etf_map().resolve(code).unwrap_or("-");
        let latest = match scorer.latest_date(code) {
            Ok(Some(d)) => d.format("%Y-%m-%d").to_string(),
            Ok(None) => "-".to_string(),
            Err(e) => return fail(&e),
        };
        println!("{code:<10} {etf:<6} {latest}");
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return fail(&e);
    }

    let summary = (|| -> Result<(), FundScoreError> {
        let data = data_settings(&config)?;
        let plan = fetch_plan_from_config(&config)?;
        let map = etf_map_from_config(&config)?;
        eprintln!("  Data:      {}/{}", data.base_path, data.fund_table);
        eprintln!("  ETFs:      {}/{}", data.base_path, data.etf_dir);
        eprintln!("  Tickers:   {}", plan.tickers.join(","));
        eprintln!("  Mappings:  {}", map.len());
        Ok(())
    })();

    match summary {
        Ok(()) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
