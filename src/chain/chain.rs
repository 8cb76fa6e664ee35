use rand::{SeedableRng, rngs::StdRng};

use crate::{
    accept::Acceptance,
    chain::{SelfLoopCounts, SelfLoopReason},
    constraints::Validator,
    error::{ChainError, Result},
    partition::Partition,
    proposals::Proposal,
};

/// Where a chain is in its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainState {
    NotStarted,
    Running,
    Done,
}

/// A flip walk over valid partitions: propose, validate, accept, emit.
///
/// Iterating yields `total_steps + 1` partitions, starting with the initial
/// state. A step whose candidate is invalid or not accepted re-emits the
/// current state. A proposal error is yielded once and ends the run.
pub struct MarkovChain<P = Box<dyn Proposal>, A = Box<dyn Acceptance>> {
    proposal: P,
    validator: Validator,
    acceptance: A,
    current: Partition,
    state: ChainState,
    step: usize,
    total_steps: usize,
    rng: StdRng,
    audit_every: Option<usize>,
    counts: SelfLoopCounts,
}

impl<P: Proposal, A: Acceptance> MarkovChain<P, A> {
    /// Set up a chain of `total_steps` steps from `initial`.
    ///
    /// Fails if `total_steps` is zero, if a component reads a statistic the
    /// initial partition does not register, or if `initial` is itself invalid.
    pub fn new(proposal: P, validator: Validator, acceptance: A, initial: Partition, total_steps: usize) -> Result<Self> {
        if total_steps == 0 {
            return Err(ChainError::config("total_steps must be positive"));
        }
        proposal.ensure_supported(&initial)?;
        acceptance.ensure_supported(&initial)?;
        validator.ensure_supported(&initial)?;

        if let Some(constraint) = validator.check(&initial) {
            return Err(ChainError::InvalidInitialState { constraint: constraint.name() });
        }
        initial.settle();

        tracing::info!(
            total_steps,
            constraints = ?validator.constraints().iter().map(|c| c.name()).collect::<Vec<_>>(),
            nodes = initial.num_nodes(),
            parts = initial.num_parts(),
            "starting markov chain"
        );

        Ok(Self {
            proposal,
            validator,
            acceptance,
            current: initial,
            state: ChainState::NotStarted,
            step: 0,
            total_steps,
            rng: StdRng::from_os_rng(),
            audit_every: None,
            counts: SelfLoopCounts::default(),
        })
    }

    /// Seed the chain's random source for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Every `every` steps, check the current state's incremental statistics
    /// against a fresh recomputation (`0` disables the audit).
    pub fn with_audit(mut self, every: usize) -> Self {
        self.audit_every = (every > 0).then_some(every);
        self
    }

    #[inline] pub fn state(&self) -> ChainState { self.state }

    #[inline] pub fn total_steps(&self) -> usize { self.total_steps }

    /// Get the number of steps taken so far.
    #[inline] pub fn step(&self) -> usize { self.step }

    #[inline] pub fn current(&self) -> &Partition { &self.current }

    #[inline] pub fn validator(&self) -> &Validator { &self.validator }

    /// Get the self-loop and acceptance counts so far.
    #[inline] pub fn counts(&self) -> &SelfLoopCounts { &self.counts }

    /// Run one propose/validate/accept step, updating `current`.
    fn advance(&mut self) -> Result<()> {
        self.step += 1;
        let candidate = self.proposal.propose(&self.current, &mut self.rng)?;

        if let Some(constraint) = self.validator.check(&candidate) {
            self.counts.inc(SelfLoopReason::Invalid(constraint.kind()));
        } else if self.acceptance.accept(&self.current, &candidate, &mut self.rng) {
            candidate.settle();
            tracing::debug!(step = self.step, flips = ?candidate.flips(), "accepted move");
            self.current = candidate;
            self.counts.inc_accepted();
        } else {
            self.counts.inc(SelfLoopReason::Rejected);
        }

        if self.audit_every.is_some_and(|every| self.step % every == 0) {
            self.current.verify_incremental().inspect_err(|err| {
                tracing::warn!(step = self.step, error = %err, "incremental statistic audit failed");
            })?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.state = ChainState::Done;
        tracing::info!(
            steps = self.step,
            accepted = self.counts.accepted(),
            self_loops = self.counts.sum(),
            "markov chain finished"
        );
    }
}

impl<P: Proposal, A: Acceptance> Iterator for MarkovChain<P, A> {
    type Item = Result<Partition>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ChainState::NotStarted => {
                self.state = ChainState::Running;
                Some(Ok(self.current.clone()))
            }
            ChainState::Running => {
                if let Err(err) = self.advance() {
                    self.finish();
                    return Some(Err(err));
                }
                if self.step == self.total_steps { self.finish() }
                Some(Ok(self.current.clone()))
            }
            ChainState::Done => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.state {
            ChainState::NotStarted => self.total_steps + 1,
            ChainState::Running => self.total_steps - self.step,
            ChainState::Done => 0,
        };
        (remaining.min(1), Some(remaining))
    }
}
