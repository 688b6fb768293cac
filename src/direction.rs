use crate::models::Direction;
use crate::patterns::library;

/// Rule hits on each side for one message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionScore {
    pub debit: usize,
    pub credit: usize,
}

impl DirectionScore {
    pub fn of(body: &str) -> Self {
        let lib = library();
        Self {
            debit: lib.debit.count_matches(body),
            credit: lib.credit.count_matches(body),
        }
    }

    pub fn has_evidence(&self) -> bool {
        self.debit > 0 || self.credit > 0
    }

    /// Credit only on a strict majority; every tie, 0-0 included, is a debit.
    pub fn direction(&self) -> Direction {
        if self.credit > self.debit {
            Direction::Credit
        } else {
            Direction::Debit
        }
    }
}

pub fn resolve_direction(body: &str) -> Direction {
    DirectionScore::of(body).direction()
}
