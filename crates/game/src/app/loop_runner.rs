use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use little_zoo::{EnvError, GoalOracle, LittleZoo, StepInfo, StepOutcome};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::{parse_script_commands, usage_text, AppWiring};

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("console io: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Env(#[from] EnvError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SessionSummary {
    pub(crate) episodes: u32,
    pub(crate) successes: u32,
    pub(crate) steps: u32,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut env = match LittleZoo::new(app.config) {
        Ok(env) => env,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match app.script {
        Some(path) => match fs::read_to_string(&path) {
            Ok(content) => {
                let commands = parse_script_commands(&content).into_iter().map(Ok);
                drive(&mut env, &app.episode, commands, true, &mut out)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "script_read_failed");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let stdin = io::stdin();
            let lines = stdin.lock().lines();
            drive(&mut env, &app.episode, lines, false, &mut out)
        }
    };

    match result {
        Ok(summary) => {
            info!(
                episodes = summary.episodes,
                successes = summary.successes,
                steps = summary.steps,
                "session_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

/// Runs episodes over `commands` until they run out or `quit` is read.
/// Command errors are reported and the episode continues.
pub(crate) fn drive<O, I, W>(
    env: &mut LittleZoo<O>,
    episode: &[String],
    commands: I,
    echo: bool,
    out: &mut W,
) -> Result<SessionSummary, SessionError>
where
    O: GoalOracle,
    I: IntoIterator<Item = io::Result<String>>,
    W: Write,
{
    let mut summary = SessionSummary::default();
    let mut info = start_episode(env, episode, &mut summary, out)?;
    write!(out, "> ")?;
    out.flush()?;

    for line in commands {
        let line = line?;
        let command = line.trim();
        if echo {
            writeln!(out, "{command}")?;
        }
        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => writeln!(out, "{}", usage_text())?,
            "info" => writeln!(out, "{}", serde_json::to_string(&info).map_err(io::Error::from)?)?,
            "reset" => info = start_episode(env, episode, &mut summary, out)?,
            _ => match env.step(command) {
                Ok(outcome) => {
                    summary.steps += 1;
                    report_step(&outcome, out)?;
                    if outcome.done && outcome.reward > 0.0 {
                        summary.successes += 1;
                    }
                    info = outcome.info;
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(summary)
}

fn start_episode<O: GoalOracle, W: Write>(
    env: &mut LittleZoo<O>,
    episode: &[String],
    summary: &mut SessionSummary,
    out: &mut W,
) -> Result<StepInfo, SessionError> {
    let (text, info) = if episode.is_empty() {
        env.reset::<String>(None)?
    } else {
        env.reset(Some(episode))?
    };
    summary.episodes += 1;
    writeln!(out, "Goal: {} (max {} steps)", info.goal, info.max_steps)?;
    writeln!(out, "{text}")?;
    write_actions(&info.possible_actions, out)?;
    Ok(info)
}

fn report_step<W: Write>(outcome: &StepOutcome, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", outcome.observation)?;
    if !outcome.info.newly_grown.is_empty() {
        writeln!(out, "Grew: {}", outcome.info.newly_grown.join(", "))?;
    }
    if !outcome.info.hindsight.is_empty() {
        writeln!(out, "Also achieved: {}", outcome.info.hindsight.join(", "))?;
    }
    if outcome.done {
        let verdict = if outcome.truncated {
            "out of steps"
        } else {
            "goal reached"
        };
        writeln!(
            out,
            "Episode over after {} steps: {verdict}. Type 'reset' or 'quit'.",
            outcome.info.step
        )?;
        return Ok(());
    }
    write_actions(&outcome.info.possible_actions, out)
}

fn write_actions<W: Write>(actions: &[String], out: &mut W) -> io::Result<()> {
    writeln!(out, "Possible actions: {}", actions.join(" | "))
}
