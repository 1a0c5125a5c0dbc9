use std::collections::HashSet;

use super::domain::{CoachingPair, WorkerId};
use super::records::CoachingSessionRecord;

/// Coaching sessions keyed by `(coach, trainee)`.
///
/// Sessions missing either participant are kept in `pairs` but can never
/// satisfy a coached lookup.
#[derive(Debug, Clone, Default)]
pub struct CoachingIndex {
    pairs: Vec<CoachingPair>,
    coached: HashSet<(WorkerId, WorkerId)>,
}

impl CoachingIndex {
    pub fn build(sessions: &[CoachingSessionRecord]) -> Self {
        sessions
            .iter()
            .map(|session| CoachingPair {
                coach_id: session.coach_id.clone(),
                trainee_id: session.trainee_id.clone(),
            })
            .collect()
    }

    pub fn is_coached(&self, coach: &WorkerId, trainee: &WorkerId) -> bool {
        self.coached.contains(&(coach.clone(), trainee.clone()))
    }

    pub fn pairs(&self) -> &[CoachingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<CoachingPair> for CoachingIndex {
    fn from_iter<I: IntoIterator<Item = CoachingPair>>(iter: I) -> Self {
        let mut index = CoachingIndex::default();
        for pair in iter {
            if let (Some(coach), Some(trainee)) = (&pair.coach_id, &pair.trainee_id) {
                index.coached.insert((coach.clone(), trainee.clone()));
            }
            index.pairs.push(pair);
        }
        index
    }
}
