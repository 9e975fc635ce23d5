// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suitebridge command line: validate configuration and run record queries
//! against the configured RESTlet.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use suitebridge::{Credentials, QuerySpec, RecordService, RecordType, init_tracing};
use suitebridge_config::{ConfigError, SuitebridgeConfig};

/// Suitebridge - paginated record access over NetSuite-style backends.
#[derive(Parser, Debug)]
#[command(name = "suitebridge", version, about, long_about = None)]
struct Cli {
    /// Configuration file, instead of the XDG lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and validate configuration, then exit.
    Check,
    /// Fetch one page of records and print it as JSON.
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Record type, e.g. `customer` or `invoice`.
    record_type: String,
    /// Id set: `1,2,5-9` or `[1,2,3]`.
    #[arg(long)]
    ids: Option<String>,
    /// Inclusive id range `start,end`.
    #[arg(long)]
    id_range: Option<String>,
    #[arg(long)]
    created_since: Option<String>,
    #[arg(long)]
    created_before: Option<String>,
    #[arg(long)]
    updated_since: Option<String>,
    #[arg(long)]
    updated_before: Option<String>,
    /// Comma-separated domain field names.
    #[arg(long)]
    fields: Option<String>,
    #[arg(long)]
    page_size: Option<u32>,
    /// Continuation token from a previous page.
    #[arg(long)]
    page_token: Option<String>,
    #[arg(long)]
    sort_by: Option<String>,
    /// `asc` or `desc`.
    #[arg(long)]
    order: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    subsidiary_id: Option<String>,
    #[arg(long)]
    include_inactive: bool,
    #[arg(long)]
    body_fields_only: bool,
    #[arg(long)]
    fast: bool,
    /// Credential header forwarded to the backend, as `NAME=VALUE`. Repeatable.
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            suitebridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    match cli.command {
        Commands::Check => {
            println!(
                "suitebridge: config ok (api_version={}, max_batch_size={}, cache_ttl={}s)",
                config.backend.api_version, config.batch.max_batch_size, config.cache.ttl_secs
            );
        }
        Commands::Query(args) => {
            if let Err(e) = run_query(config, args).await {
                eprintln!("error [{}]: {e}", e.kind());
                std::process::exit(1);
            }
        }
    }
}

fn load(path: Option<&std::path::Path>) -> Result<SuitebridgeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => suitebridge_config::load_and_validate_path(path),
        None => suitebridge_config::load_and_validate(),
    }
}

async fn run_query(
    config: SuitebridgeConfig,
    args: QueryArgs,
) -> Result<(), suitebridge::SuitebridgeError> {
    let service = RecordService::from_config(config)?;
    let record_type = RecordType::new(&args.record_type);
    let credentials = Credentials::from_headers(args.headers.clone());
    let spec = service.query(&record_type, builder(args))?;

    let page = service.execute(&credentials, &spec, &record_type).await?;
    let rendered = serde_json::to_string_pretty(&page).map_err(|e| {
        suitebridge::SuitebridgeError::Internal(format!("failed to render page: {e}"))
    })?;
    println!("{rendered}");
    Ok(())
}

fn builder(args: QueryArgs) -> suitebridge::QuerySpecBuilder {
    let mut b = QuerySpec::builder()
        .include_inactive(args.include_inactive)
        .body_fields_only(args.body_fields_only)
        .fast(args.fast);
    if let Some(v) = args.ids {
        b = b.ids(v);
    }
    if let Some(v) = args.id_range {
        b = b.id_range(v);
    }
    if let Some(v) = args.created_since {
        b = b.created_since(v);
    }
    if let Some(v) = args.created_before {
        b = b.created_before(v);
    }
    if let Some(v) = args.updated_since {
        b = b.updated_since(v);
    }
    if let Some(v) = args.updated_before {
        b = b.updated_before(v);
    }
    if let Some(v) = args.fields {
        b = b.fields_csv(&v);
    }
    if let Some(v) = args.page_size {
        b = b.page_size(v);
    }
    if let Some(v) = args.page_token {
        b = b.page_token(v);
    }
    if let Some(v) = args.sort_by {
        b = b.sort_by(v);
    }
    if let Some(v) = args.order {
        b = b.order(v);
    }
    if let Some(v) = args.search {
        b = b.search(v);
    }
    if let Some(v) = args.subsidiary_id {
        b = b.subsidiary_id(v);
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_flag_splits_on_first_equals() {
        assert_eq!(
            parse_header("Authorization=NLAuth a=b").unwrap(),
            ("Authorization".to_string(), "NLAuth a=b".to_string())
        );
        assert!(parse_header("=x").is_err());
        assert!(parse_header("novalue").is_err());
    }

    #[test]
    fn query_args_parse() {
        let cli = Cli::parse_from([
            "suitebridge",
            "query",
            "customer",
            "--ids",
            "1-3",
            "--fields",
            "email,name",
            "--header",
            "NS-Account=TSTDRV1",
        ]);
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.ids.as_deref(), Some("1-3"));
        assert_eq!(args.headers.len(), 1);
    }
}
