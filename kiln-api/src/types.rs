//! Run outputs

use kiln_core::{SliceStatus, TriggerFault};

/// Result of driving a program until it stopped
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOutput {
    /// Lines printed by the program, in order
    pub output: Vec<String>,
    /// Physics steps taken
    pub ticks: u64,
    /// How the last slice ended (`Finished` or `Broken`)
    pub status: SliceStatus,
    /// Faults contained to trigger runs
    pub trigger_faults: Vec<TriggerFault>,
    /// Diagnostics shown at the end of the run
    pub nags: Vec<String>,
}
