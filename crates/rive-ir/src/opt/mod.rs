//! RIR optimization passes.

mod const_fold;
mod dce;

pub use const_fold::ConstantFolding;
pub use dce::DeadCodeElimination;

use crate::RirModule;

/// An optimization pass over a whole module.
pub trait OptimizationPass {
    fn name(&self) -> &str;

    /// Runs the pass, returning whether anything changed.
    fn run(&self, module: &mut RirModule) -> bool;
}

/// Applies a pass pipeline to a fixed point, with an iteration cap as a
/// backstop against oscillating passes.
pub struct Optimizer {
    passes: Vec<Box<dyn OptimizationPass>>,
}

const MAX_ITERATIONS: usize = 10;

impl Optimizer {
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(ConstantFolding),
                Box::new(DeadCodeElimination),
            ],
        }
    }

    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn add_pass(&mut self, pass: Box<dyn OptimizationPass>) -> &mut Self {
        self.passes.push(pass);
        self
    }

    pub fn optimize(&self, module: &mut RirModule) {
        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for pass in &self.passes {
                changed |= pass.run(module);
            }
            if !changed {
                return;
            }
        }
    }

    pub fn optimize_once(&self, module: &mut RirModule) {
        for pass in &self.passes {
            pass.run(module);
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rive_core::types::TypeRegistry;

    #[test]
    fn optimizing_an_empty_module_terminates() {
        let optimizer = Optimizer::new();
        let mut module = RirModule::new(TypeRegistry::new());
        optimizer.optimize(&mut module);
        assert!(module.functions.is_empty());
    }

    #[test]
    fn empty_optimizer_has_no_passes() {
        let mut optimizer = Optimizer::empty();
        optimizer.add_pass(Box::new(ConstantFolding));
        let mut module = RirModule::new(TypeRegistry::new());
        optimizer.optimize_once(&mut module);
    }
}
