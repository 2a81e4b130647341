//! Ordered "first match wins" heuristics.

/// A named heuristic over some input.
pub(crate) struct Strategy<'a, I: ?Sized, O> {
    pub name: &'static str,
    pub probe: Box<dyn Fn(&I) -> Option<O> + Send + Sync + 'a>,
}

/// Runs strategies in order and keeps the first hit.
///
/// New heuristics are appended with [`StrategyChain::then`] without touching
/// the ones already registered.
pub(crate) struct StrategyChain<'a, I: ?Sized, O> {
    target: &'static str,
    strategies: Vec<Strategy<'a, I, O>>,
}

impl<'a, I: ?Sized, O> StrategyChain<'a, I, O> {
    pub(crate) fn new(target: &'static str) -> Self {
        Self {
            target,
            strategies: Vec::new(),
        }
    }

    pub(crate) fn then<F>(mut self, name: &'static str, probe: F) -> Self
    where
        F: Fn(&I) -> Option<O> + Send + Sync + 'a,
    {
        self.strategies.push(Strategy {
            name,
            probe: Box::new(probe),
        });
        self
    }

    /// Returns the first success along with the name of the strategy that produced it.
    pub(crate) fn first_match(&self, input: &I) -> Option<(&'static str, O)> {
        for strategy in &self.strategies {
            if let Some(found) = (strategy.probe)(input) {
                tracing::debug!("{}: matched by '{}'", self.target, strategy.name);
                return Some((strategy.name, found));
            }
        }
        tracing::debug!("{}: no strategy matched", self.target);
        None
    }

    pub(crate) fn resolve(&self, input: &I) -> Option<O> {
        self.first_match(input).map(|(_, found)| found)
    }
}
