use anyhow::Result;
use clap::Parser;
use color_eyre::eyre::eyre;
use lexi_core::{
    fetch_and_verify, run_import, ChecksumHex, CommitDir, CommitId, Config, DataPlane,
    FetchRequest, ImportRequest, PipelineError, SystemFetcher, Variant,
};
use serde_json::json;

mod cli;
mod output;

use cli::{Command, ConfigCommand, EnableArgs, FetchArgs, FilterArgs, ImportArgs, LexiCli, StageArgs};
use output::{Outcome, UserError};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = LexiCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let outcome = dispatch(&cli);
    let code = output::emit(&cli, outcome).map_err(|err| eyre!("{err:?}"))?;
    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("lexi_core={level},lexi_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn dispatch(cli: &LexiCli) -> Result<Outcome> {
    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir.clone());
    }
    let plane = DataPlane::open(&config)?;

    match &cli.command {
        Command::Import(args) => cmd_import(&plane, &config, args),
        Command::Fetch(args) => cmd_fetch(&plane, &config, args),
        Command::Expand(args) => cmd_expand(&plane, args),
        Command::Pool(args) => cmd_pool(&plane, args),
        Command::Filter(args) => cmd_filter(&plane, args),
        Command::Enable(args) => cmd_enable(&plane, args),
        Command::Disable { id } => cmd_disable(&plane, id),
        Command::Languages => cmd_languages(&plane),
        Command::Jobs => cmd_jobs(&plane),
        Command::Config(cmd) => cmd_config(&plane, cmd),
    }
}

fn commit_dir(plane: &DataPlane, args: &StageArgs) -> Result<CommitDir> {
    Ok(CommitDir::new(
        plane.data_dir(),
        parse_variant(&args.variant)?,
        parse_commit(&args.commit)?,
    ))
}

fn parse_variant(input: &str) -> Result<Variant> {
    Variant::parse(input).map_err(|_| PipelineError::InvalidVariant(input.to_string()).into())
}

fn parse_commit(input: &str) -> Result<CommitId> {
    CommitId::parse(input).map_err(|_| PipelineError::InvalidCommit(input.to_string()).into())
}

fn parse_checksum(input: &str) -> Result<ChecksumHex> {
    ChecksumHex::parse(input).map_err(|_| PipelineError::InvalidChecksum(input.to_string()).into())
}

fn cmd_import(plane: &DataPlane, config: &Config, args: &ImportArgs) -> Result<Outcome> {
    let request = ImportRequest {
        variant: parse_variant(&args.fetch.stage.variant)?,
        commit: parse_commit(&args.fetch.stage.commit)?,
        dic_sha256: parse_checksum(&args.fetch.dic_sha256)?,
        aff_sha256: parse_checksum(&args.fetch.aff_sha256)?,
        filter_mode: args.filter_mode.into(),
        enable: args.enable,
        min_length: args.min_length,
    };
    let fetcher = SystemFetcher::new(config.network().timeout, config.network().online)?;
    let report = run_import(plane, config, &fetcher, &request)?;

    let message = format!(
        "imported {}@{}: {} guesses, {} active answers{}",
        request.variant,
        request.commit,
        report.pools.guess_pool,
        report.filter.activated,
        if report.enabled.is_some() {
            ", language enabled"
        } else {
            ""
        }
    );
    Ok(Outcome::new(
        message,
        json!({
            "jobId": report.job_id,
            "cacheHit": report.cache_hit,
            "source": report.source,
            "expansion": report.expansion,
            "pools": report.pools,
            "filter": report.filter,
            "enabled": report.enabled,
        }),
    ))
}

fn cmd_fetch(plane: &DataPlane, config: &Config, args: &FetchArgs) -> Result<Outcome> {
    let paths = commit_dir(plane, &args.stage)?;
    let request = FetchRequest {
        dic_sha256: parse_checksum(&args.dic_sha256)?,
        aff_sha256: parse_checksum(&args.aff_sha256)?,
    };
    let fetcher = SystemFetcher::new(config.network().timeout, config.network().online)?;
    let outcome = fetch_and_verify(&paths, &fetcher, &config.upstream().base_url, &request)?;
    let message = if outcome.cache_hit {
        format!("sources for {}@{} already verified", paths.variant(), paths.commit())
    } else {
        format!("fetched and verified {}@{}", paths.variant(), paths.commit())
    };
    Ok(Outcome::new(
        message,
        json!({ "cacheHit": outcome.cache_hit, "manifest": outcome.manifest }),
    ))
}

fn cmd_expand(plane: &DataPlane, args: &StageArgs) -> Result<Outcome> {
    let paths = commit_dir(plane, args)?;
    let manifest = lexi_core::expand_forms(&paths)?;
    Ok(Outcome::new(
        format!(
            "expanded {} entries into {} forms ({} dropped)",
            manifest.entry_count, manifest.expanded_count, manifest.dropped_count
        ),
        json!(manifest),
    ))
}

fn cmd_pool(plane: &DataPlane, args: &StageArgs) -> Result<Outcome> {
    let paths = commit_dir(plane, args)?;
    let manifest = lexi_core::derive_pools(&paths)?;
    Ok(Outcome::new(
        format!(
            "derived pools: {} guesses, {} answers",
            manifest.guess_pool, manifest.answer_pool
        ),
        json!(manifest),
    ))
}

fn cmd_filter(plane: &DataPlane, args: &FilterArgs) -> Result<Outcome> {
    let paths = commit_dir(plane, &args.stage)?;
    let manifest = lexi_core::filter_answers(&paths, args.mode.into())?;
    Ok(Outcome::new(
        format!(
            "filtered answers: {} in, {} denied, {} activated",
            manifest.input, manifest.denied, manifest.activated
        ),
        json!(manifest),
    ))
}

fn cmd_enable(plane: &DataPlane, args: &EnableArgs) -> Result<Outcome> {
    let variant = parse_variant(&args.stage.variant)?;
    let commit = parse_commit(&args.stage.commit)?;
    let entry = plane.enable_language(variant, &commit, args.min_length)?;
    Ok(Outcome::new(
        format!("enabled {} from {}", entry.id, commit),
        json!(entry),
    ))
}

fn cmd_disable(plane: &DataPlane, id: &str) -> Result<Outcome> {
    if plane.registry.snapshot()?.entry(id).is_none() {
        return Err(UserError(format!("unknown language '{id}'")).into());
    }
    plane.disable_language(id)?;
    Ok(Outcome::new(format!("disabled {id}"), json!({ "id": id })))
}

fn cmd_languages(plane: &DataPlane) -> Result<Outcome> {
    let state = plane.registry.snapshot()?;
    Ok(Outcome::new(
        output::language_table(&state.languages),
        json!(state),
    ))
}

fn cmd_jobs(plane: &DataPlane) -> Result<Outcome> {
    let state = plane.jobs.snapshot()?;
    Ok(Outcome::new(output::job_table(&state.jobs), json!(state)))
}

fn cmd_config(plane: &DataPlane, cmd: &ConfigCommand) -> Result<Outcome> {
    match cmd {
        ConfigCommand::Get { key } => {
            let state = plane.app_config.snapshot()?;
            let value = state.get(key);
            Ok(Outcome::new(
                value.unwrap_or("(unset)").to_string(),
                json!({ "key": key, "value": value }),
            ))
        }
        ConfigCommand::Set { key, value } => {
            plane.app_config.set_override(key, Some(value.clone()))?;
            Ok(Outcome::new(
                format!("set {key}"),
                json!({ "key": key, "value": value }),
            ))
        }
        ConfigCommand::Unset { key } => {
            plane.app_config.set_override(key, None)?;
            Ok(Outcome::new(
                format!("unset {key}"),
                json!({ "key": key, "value": null }),
            ))
        }
    }
}
