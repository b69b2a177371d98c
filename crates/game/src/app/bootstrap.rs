use std::path::PathBuf;

use little_zoo::{ConfigError, ZooConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LaunchArgs {
    Help,
    Run(Launch),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Launch {
    pub(crate) script: Option<PathBuf>,
    /// `[goal, object, ...]`; empty samples a goal per episode.
    pub(crate) episode: Vec<String>,
}

pub(crate) struct AppWiring {
    pub(crate) config: ZooConfig,
    pub(crate) script: Option<PathBuf>,
    pub(crate) episode: Vec<String>,
}

pub(crate) fn build_app(launch: Launch) -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== LittleZoo Startup ===");

    let config = ZooConfig::from_env()?;
    info!(
        nb_objects = config.nb_objects,
        train = config.train,
        seed = ?config.seed,
        scripted = launch.script.is_some(),
        "config_ready"
    );

    Ok(AppWiring {
        config,
        script: launch.script,
        episode: launch.episode,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub(crate) fn parse_args<I>(args: I) -> Result<LaunchArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args = args.into_iter().collect::<Vec<_>>();
    let mut launch = Launch::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(LaunchArgs::Help),
            "--script" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --script".to_string())?;
                launch.script = Some(PathBuf::from(value));
                index += 2;
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option '{flag}'"));
            }
            _ => break,
        }
    }
    launch.episode = args[index..].to_vec();
    Ok(LaunchArgs::Run(launch))
}

pub(crate) fn usage_text() -> String {
    [
        "Usage:",
        "  little_zoo [--script <file>] [<goal> <object>...]",
        "",
        "Examples:",
        "  little_zoo",
        "  little_zoo \"Grow carrot\" \"red carrot\" water",
        "  little_zoo --script runs/grow_cow.txt \"Grow cow\" cow carrot water",
        "",
        "Commands: go to <object>, grasp, release <object>, release all",
        "Meta: help, info, reset, quit",
        "",
        "Environment: ZOO_CONFIG=<config.json>, ZOO_SEED=<u64>, RUST_LOG=<filter>",
    ]
    .join("\n")
}

/// Script lines minus blanks and `#` comments.
pub(crate) fn parse_script_commands(content: &str) -> Vec<String> {
    let mut commands = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        commands.push(trimmed.to_string());
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parse_args_splits_script_flag_from_episode() {
        let parsed = parse_args(args(&["--script", "run.txt", "Grow cow", "cow", "water"]))
            .expect("parse");
        assert_eq!(
            parsed,
            LaunchArgs::Run(Launch {
                script: Some(PathBuf::from("run.txt")),
                episode: args(&["Grow cow", "cow", "water"]),
            })
        );
        assert_eq!(
            parse_args(Vec::new()).expect("empty"),
            LaunchArgs::Run(Launch::default())
        );
    }

    #[test]
    fn parse_args_rejects_bad_flags() {
        assert_eq!(parse_args(args(&["--help"])).expect("help"), LaunchArgs::Help);
        let missing = parse_args(args(&["--script"])).expect_err("missing value");
        assert!(missing.contains("--script"));
        let unknown = parse_args(args(&["--seed", "3"])).expect_err("unknown flag");
        assert!(unknown.contains("--seed"));
    }

    #[test]
    fn parse_script_commands_ignores_blank_and_comment_lines() {
        let content = r#"
            # fetch water first
            go to water
            grasp

            # then feed the seed
            go to carrot seed
            release all
        "#;
        assert_eq!(
            parse_script_commands(content),
            vec!["go to water", "grasp", "go to carrot seed", "release all"]
        );
    }
}
