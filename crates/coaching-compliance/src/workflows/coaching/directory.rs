use std::collections::HashMap;

use super::domain::{DirectoryEntry, WorkerId};
use super::records::WorkerRecord;

pub const NOT_FOUND_LABEL: &str = "*Employee Not Found*";
pub const UNKNOWN_MANAGER_LABEL: &str = "Unknown Manager";
pub const UNKNOWN_EMPLOYEE_LABEL: &str = "Unknown Employee";

/// Projects worker records into the employee/manager/director relation.
#[derive(Debug, Clone, Default)]
pub struct DirectoryBuilder {
    excluded_worker: Option<String>,
}

impl DirectoryBuilder {
    pub fn new(excluded_worker: Option<String>) -> Self {
        Self { excluded_worker }
    }

    pub fn build(&self, workers: &[WorkerRecord]) -> Vec<DirectoryEntry> {
        workers
            .iter()
            .filter_map(|worker| self.entry_for(worker))
            .collect()
    }

    fn entry_for(&self, worker: &WorkerRecord) -> Option<DirectoryEntry> {
        let director_id = worker.director_id.clone()?;
        if self.is_excluded(worker) {
            return None;
        }

        let manager_id = worker
            .manager_id
            .clone()
            .unwrap_or_else(|| director_id.clone());

        Some(DirectoryEntry {
            employee_id: worker.id.clone(),
            manager_id,
            director_id,
        })
    }

    fn is_excluded(&self, worker: &WorkerRecord) -> bool {
        match (&self.excluded_worker, &worker.name) {
            (Some(excluded), Some(name)) => excluded == name,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Result of a name lookup. Never an error: callers pick the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLookup<'a> {
    Found(&'a str),
    NotFound,
}

impl<'a> NameLookup<'a> {
    pub fn or(self, placeholder: &'a str) -> &'a str {
        match self {
            NameLookup::Found(name) => name,
            NameLookup::NotFound => placeholder,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, NameLookup::Found(_))
    }
}

/// Identifier -> contact details for every fetched worker, excluded ones included.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    contacts: HashMap<WorkerId, Contact>,
}

impl NameDirectory {
    pub fn from_workers(workers: &[WorkerRecord]) -> Self {
        let contacts = workers
            .iter()
            .map(|worker| {
                (
                    worker.id.clone(),
                    Contact {
                        name: worker.name.clone(),
                        email: worker.email.clone(),
                    },
                )
            })
            .collect();
        Self { contacts }
    }

    pub fn lookup(&self, id: &WorkerId) -> NameLookup<'_> {
        match self
            .contacts
            .get(id)
            .and_then(|contact| contact.name.as_deref())
        {
            Some(name) => NameLookup::Found(name),
            None => NameLookup::NotFound,
        }
    }

    pub fn name_or<'a>(&'a self, id: &WorkerId, placeholder: &'a str) -> &'a str {
        self.lookup(id).or(placeholder)
    }

    pub fn email(&self, id: &WorkerId) -> Option<&str> {
        self.contacts
            .get(id)
            .and_then(|contact| contact.email.as_deref())
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
