use std::path::PathBuf;

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;
use miette::{miette, Result};
use reqwest::Client;

use crate::{
    app_config::Credentials,
    config::Config,
    integrations::github::GitHub,
    release::{list_merged_pull_requests, PullRequestRef, RecordBuilder},
    render::Channel,
    state::RunType,
};

mod app_config;
mod config;
mod event;
mod integrations;
mod release;
mod render;
mod state;
mod workflow;

/// Parse the command line and do what it says.
pub async fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let credentials = Credentials::from_env();
    let client = Client::new();
    let github = GitHub::new(
        client.clone(),
        &config.github,
        credentials.github_token.clone(),
    );
    let builder = RecordBuilder::new(&github, &github, &config.notes);

    match matches.subcommand() {
        Some(("publish", sub_matches)) => {
            let renderers =
                render::renderers(&channels(sub_matches)?, &config, &credentials, &client)?;
            let pr = match pull_request_arg(sub_matches) {
                Some(pr) => pr,
                None => event::pull_request_from_env()?,
            };
            workflow::publish(&builder, &renderers, &pr, run_type(sub_matches)).await?;
        }
        Some(("list", sub_matches)) => {
            let (owner, repo, base) = repository_args(sub_matches)?;
            for pr in list_merged_pull_requests(&github, owner, repo, base).await {
                println!("{pr}");
            }
        }
        Some(("backfill", sub_matches)) => {
            let renderers =
                render::renderers(&channels(sub_matches)?, &config, &credentials, &client)?;
            let (owner, repo, base) = repository_args(sub_matches)?;
            let prs = list_merged_pull_requests(&github, owner, repo, base).await;
            info!("Backfilling {} merged pull requests", prs.len());
            workflow::backfill(&builder, &renderers, &prs, run_type(sub_matches)).await?;
        }
        _ => return Err(miette!("No command given, see --help")),
    }
    Ok(())
}

fn build_cli() -> Command {
    let owner = Arg::new("owner")
        .long("owner")
        .help("The owner of the repository, like `adobe`");
    let repo = Arg::new("repo")
        .long("repo")
        .help("The name of the repository, like `da-live`");
    let base = Arg::new("base")
        .long("base")
        .default_value("main")
        .help("Only consider pull requests merged into this branch");
    let channel = Arg::new("channel")
        .long("channel")
        .action(ArgAction::Append)
        .value_parser(Channel::NAMES)
        .default_value("document")
        .help("Where to deliver the release notes, may be repeated");
    let dry_run = Arg::new("dry-run")
        .long("dry-run")
        .action(ArgAction::SetTrue)
        .help("Read from GitHub as usual, but only log what would be delivered");

    command!()
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a config file, defaults to docket.toml if it exists"),
        )
        .subcommand(
            Command::new("publish")
                .about("Publish the release notes of one merged pull request")
                .arg(owner.clone().requires_all(["repo", "pr"]))
                .arg(repo.clone().requires_all(["owner", "pr"]))
                .arg(
                    Arg::new("pr")
                        .long("pr")
                        .value_parser(value_parser!(u64))
                        .requires_all(["owner", "repo"])
                        .help("The pull request number. Without it, the GitHub Actions event is used"),
                )
                .arg(channel.clone())
                .arg(dry_run.clone()),
        )
        .subcommand(
            Command::new("list")
                .about("Print every merged pull request of a repository")
                .arg(owner.clone().required(true))
                .arg(repo.clone().required(true))
                .arg(base.clone()),
        )
        .subcommand(
            Command::new("backfill")
                .about("Publish the release notes of every merged pull request of a repository")
                .arg(owner.required(true))
                .arg(repo.required(true))
                .arg(base)
                .arg(channel)
                .arg(dry_run),
        )
}

/// Requested channels in the order given, each at most once.
fn channels(matches: &ArgMatches) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();
    for name in matches.get_many::<String>("channel").into_iter().flatten() {
        let channel = name.parse::<Channel>().map_err(|err| miette!(err))?;
        if !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    Ok(channels)
}

fn pull_request_arg(matches: &ArgMatches) -> Option<PullRequestRef> {
    let owner = matches.get_one::<String>("owner")?;
    let repo = matches.get_one::<String>("repo")?;
    let number = matches.get_one::<u64>("pr")?;
    Some(PullRequestRef::new(owner, repo, *number))
}

fn repository_args(matches: &ArgMatches) -> Result<(&str, &str, &str)> {
    let arg = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(String::as_str)
            .ok_or_else(|| miette!("--{name} is required"))
    };
    Ok((arg("owner")?, arg("repo")?, arg("base")?))
}

fn run_type(matches: &ArgMatches) -> RunType {
    if matches.get_flag("dry-run") {
        info!("Dry run, nothing will be uploaded, published, or sent");
        RunType::DryRun
    } else {
        RunType::Real
    }
}
