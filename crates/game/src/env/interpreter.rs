use zoo_engine::{GripperSignal, PhysicalAction, Vec2};

use super::perception::Directory;
use super::EnvError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GoTo { descriptor: String },
    Grasp,
    Release(ReleaseTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseTarget {
    All,
    Named(String),
}

impl Command {
    /// Verbs are case-insensitive; descriptors keep their case.
    pub fn parse(raw: &str) -> Result<Self, EnvError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("grasp") {
            return Ok(Self::Grasp);
        }
        if let Some(rest) = strip_verb(trimmed, "go to") {
            if rest.is_empty() {
                return Err(invalid(raw, "go to needs a target"));
            }
            return Ok(Self::GoTo {
                descriptor: rest.to_string(),
            });
        }
        if let Some(rest) = strip_verb(trimmed, "release") {
            if rest
                .split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("all"))
            {
                return Ok(Self::Release(ReleaseTarget::All));
            }
            if rest.is_empty() {
                return Err(invalid(raw, "release needs a target or 'all'"));
            }
            return Ok(Self::Release(ReleaseTarget::Named(rest.to_string())));
        }
        Err(invalid(raw, "expected 'go to <object>', 'grasp' or 'release <object>|all'"))
    }

    pub fn is_grasp(&self) -> bool {
        matches!(self, Self::Grasp)
    }

    /// Resolves the command against this step's directory and inventory.
    pub fn to_action(
        &self,
        directory: &Directory,
        inventory: &[String],
        agent_position: Vec2,
    ) -> Result<PhysicalAction, EnvError> {
        match self {
            Self::GoTo { descriptor } => {
                let entry =
                    directory
                        .resolve(descriptor)
                        .ok_or_else(|| EnvError::TargetNotFound {
                            descriptor: descriptor.clone(),
                        })?;
                Ok(PhysicalAction::move_by(agent_position.delta_to(entry.position)))
            }
            Self::Grasp => Ok(PhysicalAction::grip(GripperSignal::Close)),
            Self::Release(ReleaseTarget::All) => Ok(PhysicalAction::grip(GripperSignal::ReleaseAll)),
            Self::Release(ReleaseTarget::Named(name)) => {
                let signal = if inventory.first() == Some(name) {
                    GripperSignal::ReleaseFirst
                } else {
                    GripperSignal::ReleaseOther
                };
                Ok(PhysicalAction::grip(signal))
            }
        }
    }
}

fn strip_verb<'a>(input: &'a str, verb: &str) -> Option<&'a str> {
    let head = input.get(..verb.len())?;
    if !head.eq_ignore_ascii_case(verb) {
        return None;
    }
    let rest = &input[verb.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn invalid(raw: &str, reason: &str) -> EnvError {
    EnvError::InvalidAction {
        action: raw.to_string(),
        reason: reason.to_string(),
    }
}
