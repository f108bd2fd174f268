use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    UnknownOption { kind: &'static str, value: String },
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOption { kind, value } => {
                write!(f, "unknown {kind} option: {value:?}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
