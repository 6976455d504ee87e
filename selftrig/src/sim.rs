//! Lock-step simulation of synchronous components
//!
//! Every block in this crate is a set of registers that update together on a
//! rising clock edge. A block implements [`Clocked`]: `clock` is one edge with
//! reset deasserted, `reset` is one edge with reset asserted, and `output`
//! reads the registered outputs without side effects.
//!
//! Composite blocks clock their stages downstream-first, so each stage sees
//! the value its upstream registered on the previous edge, as in hardware.

/// A synchronous, single-clock-domain block
pub trait Clocked {
    /// Inputs sampled at the rising edge
    type Input;
    /// Registered outputs
    type Output;

    /// Advance one rising edge with reset deasserted
    fn clock(&mut self, input: &Self::Input);
    /// Advance one rising edge with the synchronous reset asserted
    fn reset(&mut self);
    /// Current registered outputs
    fn output(&self) -> Self::Output;
}

/// Drives one [`Clocked`] block and keeps the cycle count.
///
/// Two ways of looking at outputs are offered. [`Simulator::step`] returns the
/// outputs after the edge settles. [`Simulator::rising_edge`] returns what a
/// testbench sampling *at* the edge sees, i.e. the values from before the
/// edge; a registered stage then shows its response to an input only at the
/// second sampled edge after the input was driven.
pub struct Simulator<C: Clocked> {
    dut: C,
    cycle: u64,
}

impl<C: Clocked> Simulator<C> {
    pub fn new(dut: C) -> Self {
        Simulator { dut, cycle: 0 }
    }

    /// Hold reset for `cycles` edges (at least one)
    pub fn reset(&mut self, cycles: usize) {
        for _ in 0..cycles.max(1) {
            self.dut.reset();
            self.cycle += 1;
        }
    }

    /// Clock one edge; returns the settled outputs
    pub fn step(&mut self, input: &C::Input) -> C::Output {
        self.dut.clock(input);
        self.cycle += 1;
        self.dut.output()
    }

    /// Clock one edge; returns the outputs as sampled at that edge
    pub fn rising_edge(&mut self, input: &C::Input) -> C::Output {
        let sampled = self.dut.output();
        self.dut.clock(input);
        self.cycle += 1;
        sampled
    }

    /// Clock `n` edges with the same input
    pub fn run(&mut self, input: &C::Input, n: usize) {
        for _ in 0..n {
            self.dut.clock(input);
            self.cycle += 1;
        }
    }

    pub fn output(&self) -> C::Output {
        self.dut.output()
    }

    /// Edges elapsed since construction, reset edges included
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn dut(&self) -> &C {
        &self.dut
    }

    pub fn dut_mut(&mut self) -> &mut C {
        &mut self.dut
    }

    pub fn into_inner(self) -> C {
        self.dut
    }
}
