//! Incubation conveyor: a capacity-limited delay line.
//!
//! Bitten population enters as a batch with a countdown. Each
//! [`IncubationConveyor::advance`] call decrements every countdown by one
//! turn and releases the batches that reach zero as outflow. A batch
//! enqueued with delay `k` is therefore released by exactly the `k`-th
//! subsequent `advance`.
//!
//! The conveyor is generic over a cohort tag. The aggregate model uses `()`;
//! the grid model tags each unit batch with the bitten agent's id so the
//! outflow says exactly who converts.

use tracing::debug;

use crate::ConveyorError;

/// A cohort in transit.
#[derive(Debug, Clone, PartialEq)]
pub struct ConveyorBatch<K> {
    /// Population in this batch. Never negative.
    pub amount: f64,
    /// Turns left before release.
    pub remaining_turns: f64,
    /// Opaque cohort tag.
    pub cohort: K,
}

/// What one `advance` released.
#[derive(Debug, Clone, PartialEq)]
pub struct Outflow<K> {
    /// Sum of the released amounts.
    pub amount: f64,
    /// The released batches, in enqueue order.
    pub batches: Vec<ConveyorBatch<K>>,
}

impl<K> Default for Outflow<K> {
    fn default() -> Self {
        Self {
            amount: 0.0,
            batches: Vec::new(),
        }
    }
}

/// Validated delay and capacity for a conveyor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncubationSettings {
    /// Turns from bite to conversion.
    pub delay_turns: f64,
    /// Maximum population in transit at once.
    pub capacity: f64,
}

impl IncubationSettings {
    /// Validate delay and capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConveyorError::InvalidDelay`] unless `delay_turns` is finite
    /// and positive, and [`ConveyorError::InvalidCapacity`] unless
    /// `capacity` is finite and non-negative.
    pub fn new(delay_turns: f64, capacity: f64) -> Result<Self, ConveyorError> {
        if !delay_turns.is_finite() || delay_turns <= 0.0 {
            return Err(ConveyorError::InvalidDelay(delay_turns));
        }
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(ConveyorError::InvalidCapacity(capacity));
        }
        Ok(Self {
            delay_turns,
            capacity,
        })
    }
}

/// Ordered batches in transit.
#[derive(Debug, Clone, PartialEq)]
pub struct IncubationConveyor<K = ()> {
    batches: Vec<ConveyorBatch<K>>,
}

impl<K> Default for IncubationConveyor<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> IncubationConveyor<K> {
    /// An empty conveyor.
    pub const fn new() -> Self {
        Self {
            batches: Vec::new(),
        }
    }

    /// Age every batch by one turn and release those that are done.
    pub fn advance(&mut self) -> Outflow<K> {
        for batch in &mut self.batches {
            batch.remaining_turns -= 1.0;
        }
        let (ready, pending): (Vec<_>, Vec<_>) = core::mem::take(&mut self.batches)
            .into_iter()
            .partition(|batch| batch.remaining_turns <= 0.0);
        self.batches = pending;

        let amount: f64 = ready.iter().map(|batch| batch.amount).sum();
        if !ready.is_empty() {
            debug!(released = ready.len(), amount, "Incubation batches released");
        }
        Outflow {
            amount,
            batches: ready,
        }
    }

    /// Enqueue up to `amount` with a cohort tag, clamped to free capacity.
    ///
    /// Returns the amount accepted. Nothing is enqueued if that is not
    /// positive.
    pub fn try_enqueue_cohort(
        &mut self,
        amount: f64,
        delay_turns: f64,
        capacity: f64,
        cohort: K,
    ) -> f64 {
        let accepted = amount.min(self.free_capacity(capacity));
        if accepted.is_nan() || accepted <= 0.0 {
            return 0.0;
        }
        self.batches.push(ConveyorBatch {
            amount: accepted,
            remaining_turns: delay_turns,
            cohort,
        });
        accepted
    }

    /// Room left under `capacity`, never negative.
    pub fn free_capacity(&self, capacity: f64) -> f64 {
        (capacity - self.current_total()).max(0.0)
    }

    /// Population currently in transit.
    pub fn current_total(&self) -> f64 {
        self.batches.iter().map(|batch| batch.amount).sum()
    }

    /// Number of batches in transit.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether nothing is in transit.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Batches in enqueue order.
    pub fn batches(&self) -> &[ConveyorBatch<K>] {
        &self.batches
    }
}

impl<K: Default> IncubationConveyor<K> {
    /// Enqueue up to `amount` with the default cohort tag.
    pub fn try_enqueue(&mut self, amount: f64, delay_turns: f64, capacity: f64) -> f64 {
        self.try_enqueue_cohort(amount, delay_turns, capacity, K::default())
    }
}
