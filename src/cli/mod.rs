//! Command-line workflow, decoupled from clap so it can be driven from tests

pub mod orchestration;

pub use orchestration::{
    build_config, run_check_workflow, run_release_workflow, WorkflowArgs, WorkflowResult,
};
