//! Reducible quantities of one functional instance.
//!
//! A functional subscribes each quantity once, at construction, and keeps
//! the returned id. While it runs it gathers partial values; partial
//! registries of the same logical reduction (other sub-domains, other
//! blocks, other processes) are merged in; then the registry is evaluated
//! and only from that point on can values be read back.
//!
//! Ids are typed by the aggregate they refer to, so a sum can never be
//! read back as a maximum.

use crate::communicator::Communicator;

#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct SumId(usize);

#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct IntSumId(usize);

#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct MinId(usize);

#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct MaxId(usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Accumulating,
    Evaluated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRegistry {
    sums: Vec<f64>,
    int_sums: Vec<i64>,
    mins: Vec<f64>,
    maxs: Vec<f64>,
    phase: Phase,
}

impl Default for StatisticsRegistry {
    fn default() -> Self {
        StatisticsRegistry {
            sums: Vec::new(),
            int_sums: Vec::new(),
            mins: Vec::new(),
            maxs: Vec::new(),
            phase: Phase::Accumulating,
        }
    }
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn subscribe_sum(&mut self) -> SumId {
        self.sums.push(0.0);
        SumId(self.sums.len() - 1)
    }

    pub fn subscribe_int_sum(&mut self) -> IntSumId {
        self.int_sums.push(0);
        IntSumId(self.int_sums.len() - 1)
    }

    pub fn subscribe_min(&mut self) -> MinId {
        self.mins.push(f64::INFINITY);
        MinId(self.mins.len() - 1)
    }

    pub fn subscribe_max(&mut self) -> MaxId {
        self.maxs.push(f64::NEG_INFINITY);
        MaxId(self.maxs.len() - 1)
    }

    #[track_caller]
    fn assert_accumulating(&self) {
        assert_eq!(
            self.phase,
            Phase::Accumulating,
            "statistics gathered after evaluation; call reset() first"
        );
    }

    #[track_caller]
    fn assert_evaluated(&self) {
        assert_eq!(
            self.phase,
            Phase::Evaluated,
            "statistics read before all contributions were evaluated"
        );
    }

    #[inline]
    #[track_caller]
    pub fn gather_sum(&mut self, id: SumId, value: f64) {
        self.assert_accumulating();
        self.sums[id.0] += value;
    }

    #[inline]
    #[track_caller]
    pub fn gather_int_sum(&mut self, id: IntSumId, value: i64) {
        self.assert_accumulating();
        self.int_sums[id.0] += value;
    }

    #[inline]
    #[track_caller]
    pub fn gather_min(&mut self, id: MinId, value: f64) {
        self.assert_accumulating();
        self.mins[id.0] = self.mins[id.0].min(value);
    }

    #[inline]
    #[track_caller]
    pub fn gather_max(&mut self, id: MaxId, value: f64) {
        self.assert_accumulating();
        self.maxs[id.0] = self.maxs[id.0].max(value);
    }

    /// Fold the partial results of another evaluation of the same
    /// functional into this one.
    #[track_caller]
    pub fn merge(&mut self, other: &StatisticsRegistry) {
        self.assert_accumulating();
        assert!(
            self.sums.len() == other.sums.len()
                && self.int_sums.len() == other.int_sums.len()
                && self.mins.len() == other.mins.len()
                && self.maxs.len() == other.maxs.len(),
            "merging statistics with different subscriptions"
        );
        for (a, b) in self.sums.iter_mut().zip(&other.sums) {
            *a += b;
        }
        for (a, b) in self.int_sums.iter_mut().zip(&other.int_sums) {
            *a += b;
        }
        for (a, b) in self.mins.iter_mut().zip(&other.mins) {
            *a = a.min(*b);
        }
        for (a, b) in self.maxs.iter_mut().zip(&other.maxs) {
            *a = a.max(*b);
        }
    }

    /// Combine the partial results of every participant of `comm`.
    pub fn all_reduce<C: Communicator + ?Sized>(&mut self, comm: &C) {
        self.assert_accumulating();
        comm.all_reduce_sum(&mut self.sums);
        comm.all_reduce_int_sum(&mut self.int_sums);
        comm.all_reduce_min(&mut self.mins);
        comm.all_reduce_max(&mut self.maxs);
    }

    /// Close the accumulation phase.
    pub fn evaluate(&mut self) {
        self.phase = Phase::Evaluated;
    }

    /// Start a new accumulation round with the same subscriptions.
    pub fn reset(&mut self) {
        self.sums.iter_mut().for_each(|v| *v = 0.0);
        self.int_sums.iter_mut().for_each(|v| *v = 0);
        self.mins.iter_mut().for_each(|v| *v = f64::INFINITY);
        self.maxs.iter_mut().for_each(|v| *v = f64::NEG_INFINITY);
        self.phase = Phase::Accumulating;
    }

    #[track_caller]
    pub fn sum(&self, id: SumId) -> f64 {
        self.assert_evaluated();
        self.sums[id.0]
    }

    #[track_caller]
    pub fn int_sum(&self, id: IntSumId) -> i64 {
        self.assert_evaluated();
        self.int_sums[id.0]
    }

    #[track_caller]
    pub fn min(&self, id: MinId) -> f64 {
        self.assert_evaluated();
        self.mins[id.0]
    }

    #[track_caller]
    pub fn max(&self, id: MaxId) -> f64 {
        self.assert_evaluated();
        self.maxs[id.0]
    }
}
