//! Scenario-based tests for corpus-pipeline

mod failure_handling;
mod interruption;
mod success_chain;
