//! Test helpers
//!
//! Build programs from opcode lists and drive a CPU to completion.

#![allow(dead_code)]

use kiln_core::{
    Cpu, CpuConfig, Fault, LimitConfig, Literal, Opcode, Operator, Program, SliceStatus, Value,
};
use kiln_log::Logger;

/// Result of running a program to completion
#[derive(Debug)]
pub struct ExecResult {
    pub cpu: Cpu,
    pub output: Vec<String>,
    pub slices: usize,
}

impl ExecResult {
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.cpu.global(name)
    }
}

pub fn cpu() -> Cpu {
    Cpu::new(CpuConfig::default(), LimitConfig::default(), Logger::noop())
}

pub fn cpu_with(instructions_per_update: usize, trigger_instruction_budget: usize) -> Cpu {
    let config = CpuConfig {
        instructions_per_update,
        trigger_instruction_budget,
    };
    Cpu::new(config, LimitConfig::default(), Logger::noop())
}

pub fn program(ops: Vec<Opcode>) -> Program {
    Program::from_opcodes("test.ks", ops)
}

/// Run slices of `budget` until the program finishes or faults
pub fn run_ops_with_budget(ops: Vec<Opcode>, budget: usize) -> Result<ExecResult, Fault> {
    let mut cpu = cpu();
    cpu.load(program(ops));
    let mut slices = 0;
    loop {
        slices += 1;
        let outcome = cpu.run_slice(budget)?;
        assert!(outcome.executed <= budget, "slice overran its budget");
        match outcome.status {
            SliceStatus::BudgetExhausted => continue,
            SliceStatus::Waiting => cpu.advance_physics(1.0),
            SliceStatus::Finished | SliceStatus::Broken | SliceStatus::Idle => break,
        }
    }
    let output = cpu.take_output();
    Ok(ExecResult { cpu, output, slices })
}

pub fn run_ops(ops: Vec<Opcode>) -> Result<ExecResult, Fault> {
    run_ops_with_budget(ops, 1000)
}

// ===== opcode shorthands =====

pub fn int(n: i32) -> Opcode {
    Opcode::Push(Literal::Int(n))
}

pub fn double(d: f64) -> Opcode {
    Opcode::Push(Literal::Double(d))
}

pub fn string(s: &str) -> Opcode {
    Opcode::Push(Literal::String(s.to_string()))
}

pub fn vector(x: f64, y: f64, z: f64) -> Opcode {
    Opcode::Push(Literal::Vector([x, y, z]))
}

pub fn load(name: &str) -> Opcode {
    Opcode::PushVariable(name.to_string())
}

pub fn store(name: &str) -> Opcode {
    Opcode::Store(name.to_string())
}

pub fn local(name: &str) -> Opcode {
    Opcode::StoreLocal(name.to_string())
}

pub fn binary(op: Operator) -> Opcode {
    Opcode::Binary(op)
}
