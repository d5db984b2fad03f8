use crate::data::dataset::LeavesDataset;
use crate::data::leave_period::LeavePeriod;
use crate::data::persistence::Persistable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One employee's entry as found in the stored document. Older documents hold
/// per-month day strings keyed by zero-based month index; current ones hold a
/// list of periods.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum EmployeeRecord {
    Periods(Vec<LeavePeriod>),
    LegacyMonths(BTreeMap<String, String>),
    Missing,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct LeavesDocument {
    #[serde(rename = "leavesData", default)]
    pub leaves_data: BTreeMap<String, EmployeeRecord>,
}

impl Persistable for LeavesDocument {
    fn filename() -> &'static str {
        "leaves.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl From<&LeavesDataset> for LeavesDocument {
    fn from(data: &LeavesDataset) -> Self {
        LeavesDocument {
            leaves_data: data
                .iter()
                .map(|(name, periods)| (name.clone(), EmployeeRecord::Periods(periods.clone())))
                .collect(),
        }
    }
}
