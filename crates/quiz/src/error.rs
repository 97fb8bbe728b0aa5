use html::Id;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "could not read quiz configuration: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid quiz configuration: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid quiz configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// An exercise block whose markup lacks what its kind needs. Only that block is abandoned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterializeError {
    MissingStructure {
        container: Id,
        what: &'static str,
    },
}

impl fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeError::MissingStructure { container, what } => {
                write!(f, "exercise block {} has no {what}", container.0)
            }
        }
    }
}

impl std::error::Error for MaterializeError {}

/// A host interaction that was not applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionError {
    /// No bound handler on the target or any of its ancestors.
    UnknownTarget(Id),
    UnknownExercise(String),
    /// The exercise has no such control (alternative index, text input).
    NoSuchControl {
        exercise: String,
        control: &'static str,
    },
    /// The control is disabled because the answer is submitted.
    Disabled { exercise: String },
    /// Choice submit without a selected alternative.
    NoSelection { exercise: String },
}

impl fmt::Display for InteractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionError::UnknownTarget(id) => write!(f, "no quiz handler for node {}", id.0),
            InteractionError::UnknownExercise(name) => write!(f, "unknown exercise {name}"),
            InteractionError::NoSuchControl { exercise, control } => {
                write!(f, "exercise {exercise} has no {control}")
            }
            InteractionError::Disabled { exercise } => {
                write!(f, "exercise {exercise} is submitted; edit it first")
            }
            InteractionError::NoSelection { exercise } => {
                write!(f, "exercise {exercise} has no selected alternative")
            }
        }
    }
}

impl std::error::Error for InteractionError {}
