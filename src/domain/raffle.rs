//! Raffle assignment algorithm.
//!
//! Shuffles the participants with Fisher-Yates and links them in a ring, so
//! each participant gives to the next one. The ring is a single-cycle
//! derangement: nobody draws themselves, and everybody gives and receives
//! exactly once.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Smallest group a raffle can run on.
pub const MIN_PARTICIPANTS: usize = 2;

/// Source of uniform floats in `[0, 1)`.
pub type RandomSource = Arc<dyn Fn() -> f64 + Send + Sync>;

/// One gift-giving relation, before it becomes a persisted assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RafflePair {
    pub receiver_id: String,
    pub secret_santa_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaffleResult {
    pub success: bool,
    pub assignments: Vec<RafflePair>,
    pub error: Option<String>,
}

impl RaffleResult {
    fn ok(assignments: Vec<RafflePair>) -> Self {
        Self {
            success: true,
            assignments,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            assignments: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn invalid(error: String) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }
}

#[derive(Clone, Default)]
pub struct RaffleAssigner {
    random: Option<RandomSource>,
}

impl RaffleAssigner {
    /// Assigner backed by the thread-local RNG
    pub fn new() -> Self {
        Self { random: None }
    }

    /// Assigner driven by a caller-provided source, for reproducible draws
    pub fn with_random_source<F>(random: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Self {
            random: Some(Arc::new(random)),
        }
    }

    fn next_random(&self) -> f64 {
        match &self.random {
            Some(random) => random(),
            None => rand::thread_rng().gen::<f64>(),
        }
    }

    /// Draw a gift-giving ring over `participants`.
    ///
    /// Never panics; malformed input is reported through the result.
    pub fn assign(&self, participants: &[String]) -> RaffleResult {
        if participants.len() < MIN_PARTICIPANTS {
            return RaffleResult::failed(format!(
                "At least {} members are required for a raffle",
                MIN_PARTICIPANTS
            ));
        }

        let unique: HashSet<&String> = participants.iter().collect();
        if unique.len() != participants.len() {
            return RaffleResult::failed(format!(
                "Duplicate member IDs detected: {} unique out of {}",
                unique.len(),
                participants.len()
            ));
        }

        if participants.iter().any(|id| id.is_empty()) {
            return RaffleResult::failed("Empty member ID detected");
        }

        let shuffled = self.shuffle(participants);
        let n = shuffled.len();
        let assignments: Vec<RafflePair> = (0..n)
            .map(|k| RafflePair {
                secret_santa_id: shuffled[k].clone(),
                receiver_id: shuffled[(k + 1) % n].clone(),
            })
            .collect();

        let validation = Self::validate(&assignments, participants);
        if !validation.valid {
            return RaffleResult::failed(
                validation
                    .error
                    .unwrap_or_else(|| "Raffle validation failed".to_string()),
            );
        }

        RaffleResult::ok(assignments)
    }

    /// Fisher-Yates shuffle into a new vector.
    fn shuffle(&self, participants: &[String]) -> Vec<String> {
        let mut shuffled = participants.to_vec();
        for i in (1..shuffled.len()).rev() {
            let j = ((self.next_random() * (i + 1) as f64).floor() as usize).min(i);
            shuffled.swap(i, j);
        }
        shuffled
    }

    /// Check that `assignments` is a complete derangement of `participants`.
    pub fn validate(assignments: &[RafflePair], participants: &[String]) -> ValidationResult {
        if assignments.len() != participants.len() {
            return ValidationResult::invalid(format!(
                "Expected {} assignments, got {}",
                participants.len(),
                assignments.len()
            ));
        }

        if let Some(pair) = assignments
            .iter()
            .find(|p| p.receiver_id == p.secret_santa_id)
        {
            return ValidationResult::invalid(format!(
                "Self-assignment detected for user {}",
                pair.receiver_id
            ));
        }

        let members: HashSet<&str> = participants.iter().map(String::as_str).collect();
        for pair in assignments {
            if !members.contains(pair.receiver_id.as_str()) {
                return ValidationResult::invalid(format!("Unknown receiver: {}", pair.receiver_id));
            }
            if !members.contains(pair.secret_santa_id.as_str()) {
                return ValidationResult::invalid(format!(
                    "Unknown secret santa: {}",
                    pair.secret_santa_id
                ));
            }
        }

        let mut receivers = HashSet::new();
        for pair in assignments {
            if !receivers.insert(pair.receiver_id.as_str()) {
                return ValidationResult::invalid(format!("Duplicate receiver: {}", pair.receiver_id));
            }
        }

        let mut santas = HashSet::new();
        for pair in assignments {
            if !santas.insert(pair.secret_santa_id.as_str()) {
                return ValidationResult::invalid(format!(
                    "Duplicate secret santa: {}",
                    pair.secret_santa_id
                ));
            }
        }

        for member in participants {
            if !receivers.contains(member.as_str()) {
                return ValidationResult::invalid(format!("Member {} is not receiving a gift", member));
            }
            if !santas.contains(member.as_str()) {
                return ValidationResult::invalid(format!("Member {} is not giving a gift", member));
            }
        }

        ValidationResult::ok()
    }
}
