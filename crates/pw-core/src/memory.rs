//! Process memory sampling.

use sysinfo::{Pid, System};

/// Source of memory usage figures, in bytes.
pub trait MemoryProbe {
    /// Current resident memory.
    fn current(&mut self) -> u64;

    /// Highest resident memory seen so far.
    ///
    /// Implementations may only know what they have sampled. [`ProcessMemory`]
    /// reads memory when asked, and the recorder asks at `init` and
    /// `finalize` only, so its peak is the larger of those two readings and
    /// misses any spike in between.
    fn peak(&mut self) -> u64;
}

/// Samples the resident set size of the current process.
///
/// The peak is the high-water mark of every sample taken through this probe,
/// so it is only as fine-grained as the calls to [`MemoryProbe::current`] and
/// [`MemoryProbe::peak`].
#[derive(Debug)]
pub struct ProcessMemory {
    system: System,
    pid: Option<Pid>,
    high_water: u64,
}

impl ProcessMemory {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = e, "cannot resolve current pid, memory will read as zero");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
            high_water: 0,
        }
    }

    fn sample(&mut self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        self.system.refresh_process(pid);
        let bytes = self.system.process(pid).map_or(0, sysinfo::Process::memory);
        self.high_water = self.high_water.max(bytes);
        bytes
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemory {
    fn current(&mut self) -> u64 {
        self.sample()
    }

    fn peak(&mut self) -> u64 {
        self.sample();
        self.high_water
    }
}
