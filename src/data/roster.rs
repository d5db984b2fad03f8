use crate::data::persistence::Persistable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const FALLBACK_ROSTER_SIZE: usize = 13;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("roster document not found")]
    Missing,
    #[error("roster document has no employee names")]
    Empty,
    #[error("failed to load roster: {0}")]
    Load(String),
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RosterDocument {
    #[serde(default)]
    pub employee_headers: BTreeMap<u32, String>,
}

impl Persistable for RosterDocument {
    fn filename() -> &'static str {
        "roster.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl RosterDocument {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        RosterDocument {
            employee_headers: names
                .iter()
                .enumerate()
                .map(|(i, n)| (i as u32, n.as_ref().to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub names: Vec<String>,
    pub fallback: bool,
}

impl Roster {
    pub fn from_document(doc: RosterDocument) -> Result<Self, FetchError> {
        let mut names: Vec<String> = Vec::new();
        for name in doc.employee_headers.into_values() {
            let name = name.trim().to_string();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(Roster { names, fallback: false })
    }

    pub fn fallback() -> Self {
        Roster {
            names: (1..=FALLBACK_ROSTER_SIZE)
                .map(|i| format!("Employee {i}"))
                .collect(),
            fallback: true,
        }
    }
}
