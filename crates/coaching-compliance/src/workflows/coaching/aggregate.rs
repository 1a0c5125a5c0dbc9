use std::collections::{BTreeMap, BTreeSet};

use super::directory::{NameDirectory, UNKNOWN_EMPLOYEE_LABEL, UNKNOWN_MANAGER_LABEL};
use super::domain::{AttachmentRow, DirectorReport, DirectoryEntry, ManagerSummary, WorkerId};
use super::index::CoachingIndex;

/// Turns the directory relation and coaching index into one report per director.
///
/// Directors, managers and employees are visited in identifier order, so the
/// same inputs always yield the same table and attachment ordering.
pub fn aggregate(
    directory: &[DirectoryEntry],
    coaching: &CoachingIndex,
    names: &NameDirectory,
) -> Vec<DirectorReport> {
    group_by_director(directory)
        .into_iter()
        .filter_map(|(director_id, managers)| {
            director_report(director_id, managers, coaching, names)
        })
        .collect()
}

type Hierarchy<'a> = BTreeMap<&'a WorkerId, BTreeMap<&'a WorkerId, BTreeSet<&'a WorkerId>>>;

fn group_by_director(directory: &[DirectoryEntry]) -> Hierarchy<'_> {
    let mut hierarchy: Hierarchy<'_> = BTreeMap::new();
    for entry in directory {
        hierarchy
            .entry(&entry.director_id)
            .or_default()
            .entry(&entry.manager_id)
            .or_default()
            .insert(&entry.employee_id);
    }
    hierarchy
}

fn director_report(
    director_id: &WorkerId,
    managers: BTreeMap<&WorkerId, BTreeSet<&WorkerId>>,
    coaching: &CoachingIndex,
    names: &NameDirectory,
) -> Option<DirectorReport> {
    let mut summaries = Vec::new();
    let mut attachment = Vec::new();

    // Employees reporting straight to their director are not coaching targets.
    for (manager_id, employees) in managers
        .into_iter()
        .filter(|(manager_id, _)| *manager_id != director_id)
    {
        let manager_name = names.name_or(manager_id, UNKNOWN_MANAGER_LABEL);
        let mut coached_count = 0;

        for employee_id in &employees {
            let coached = coaching.is_coached(manager_id, employee_id);
            if coached {
                coached_count += 1;
            }
            attachment.push(AttachmentRow::new(
                manager_name,
                names.name_or(employee_id, UNKNOWN_EMPLOYEE_LABEL),
                coached,
            ));
        }

        summaries.push(ManagerSummary::new(
            manager_id.clone(),
            employees.len(),
            coached_count,
        ));
    }

    if summaries.is_empty() {
        return None;
    }

    Some(DirectorReport {
        director_id: director_id.clone(),
        managers: summaries,
        attachment,
    })
}
