//! Workloads that exercise a virtual address space.
//!
//! Each program touches memory only through [`VirtualMemory`], so every
//! first access and first write to a page goes through the installed fault
//! handler. Programs seed their own generators and produce the same access
//! sequence on every run.

use std::str::FromStr;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, VmError};
use crate::storage::page_table::{FaultHandler, VirtualMemory};

/// Seed for the scan, sort and focus data.
const DATA_SEED: u64 = 38290;
/// Seed for the `mean_mode` and `count_sort` data.
const COUNT_SEED: u64 = 5103;
/// Values generated by `mean_mode` and `count_sort` lie in `[0, COUNT_SIZE)`.
const COUNT_SIZE: usize = 128;

const SCAN_PASSES: usize = 10;
const FOCUS_BURSTS: usize = 100;
const FOCUS_WRITES_PER_BURST: usize = 100;
const FOCUS_WINDOW: usize = 25;

/// Available workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Sequential write then repeated sequential reads.
    Scan,
    /// Random fill then in-place sort.
    Sort,
    /// Random writes clustered in small windows.
    Focus,
    /// Random fill, then mean and mode.
    MeanMode,
    /// Random fill, in-place sort checked against a counting sort.
    CountSort,
}

impl Program {
    /// Returns the command-line name of this program.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Program::Scan => "scan",
            Program::Sort => "sort",
            Program::Focus => "focus",
            Program::MeanMode => "mean_mode",
            Program::CountSort => "count_sort",
        }
    }

    /// Runs the program over the whole address space.
    ///
    /// # Errors
    ///
    /// Returns an error if an access fails or the program's self-check fails.
    pub fn run<H: FaultHandler>(self, vm: &mut VirtualMemory<H>) -> Result<WorkloadResult> {
        info!("running {} over {} bytes", self.name(), vm.len());
        match self {
            Program::Scan => scan(vm).map(WorkloadResult::Scan),
            Program::Sort => sort(vm).map(WorkloadResult::Sort),
            Program::Focus => focus(vm).map(WorkloadResult::Focus),
            Program::MeanMode => mean_mode(vm),
            Program::CountSort => count_sort(vm).map(WorkloadResult::CountSort),
        }
    }
}

impl FromStr for Program {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scan" => Ok(Program::Scan),
            "sort" => Ok(Program::Sort),
            "focus" => Ok(Program::Focus),
            "mean_mode" => Ok(Program::MeanMode),
            "count_sort" => Ok(Program::CountSort),
            _ => Err(VmError::UnknownProgram(s.to_string())),
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a workload computed.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadResult {
    /// Sum over all scan passes.
    Scan(u64),
    /// Sum of the sorted data.
    Sort(u64),
    /// Sum of the data after the focused writes.
    Focus(u64),
    /// Mean and most frequent value of the generated data.
    MeanMode { mean: f64, mode: u8 },
    /// Number of bytes verified against the counting sort.
    CountSort(usize),
}

impl std::fmt::Display for WorkloadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadResult::Scan(total) => write!(f, "scan result is {total}"),
            WorkloadResult::Sort(total) => write!(f, "sort result is {total}"),
            WorkloadResult::Focus(total) => write!(f, "focus result is {total}"),
            WorkloadResult::MeanMode { mean, mode } => write!(
                f,
                "mean of the randomly generated data {mean:.6}, mode of the randomly generated data {mode}"
            ),
            WorkloadResult::CountSort(len) => {
                write!(f, "count_sort verified {len} bytes against a comparison sort")
            }
        }
    }
}

fn scan<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<u64> {
    let len = vm.len();
    for addr in 0..len {
        vm.write_byte(addr, (addr % 256) as u8)?;
    }

    let mut total = 0u64;
    for _ in 0..SCAN_PASSES {
        total += sum(vm)?;
    }
    Ok(total)
}

fn sort<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<u64> {
    let mut rng = StdRng::seed_from_u64(DATA_SEED);
    for addr in 0..vm.len() {
        vm.write_byte(addr, rng.gen())?;
    }
    heap_sort(vm)?;
    sum(vm)
}

fn focus<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<u64> {
    let len = vm.len();
    let mut rng = StdRng::seed_from_u64(DATA_SEED);
    for addr in 0..len {
        vm.write_byte(addr, 0)?;
    }

    for _ in 0..FOCUS_BURSTS {
        let start = rng.gen_range(0..len);
        for _ in 0..FOCUS_WRITES_PER_BURST {
            let addr = (start + rng.gen_range(0..FOCUS_WINDOW)) % len;
            vm.write_byte(addr, rng.gen())?;
        }
    }
    sum(vm)
}

#[allow(clippy::cast_precision_loss)]
fn mean_mode<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<WorkloadResult> {
    let (total, counts) = fill_counted(vm)?;
    let mean = total as f64 / vm.len() as f64;

    let mut mode = 0;
    let mut max_count = 0;
    for (value, &count) in counts.iter().enumerate() {
        if count > max_count {
            mode = value as u8;
            max_count = count;
        }
    }
    Ok(WorkloadResult::MeanMode { mean, mode })
}

fn count_sort<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<usize> {
    let (_, counts) = fill_counted(vm)?;

    let mut expected = Vec::with_capacity(vm.len());
    for (value, &count) in counts.iter().enumerate() {
        expected.extend(std::iter::repeat(value as u8).take(count));
    }

    heap_sort(vm)?;
    for (addr, &want) in expected.iter().enumerate() {
        let got = vm.read_byte(addr)?;
        if got != want {
            return Err(VmError::WorkloadCheck(format!(
                "sorted data has {got} at {addr:#x}, counting sort expected {want}"
            )));
        }
    }
    Ok(expected.len())
}

/// Fills memory with values in `[0, COUNT_SIZE)`; returns their sum and histogram.
fn fill_counted<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<(u64, Vec<usize>)> {
    let mut rng = StdRng::seed_from_u64(COUNT_SEED);
    let mut counts = vec![0usize; COUNT_SIZE];
    let mut total = 0u64;

    for addr in 0..vm.len() {
        let value = rng.gen_range(0..COUNT_SIZE);
        vm.write_byte(addr, value as u8)?;
        counts[value] += 1;
        total += value as u64;
    }
    Ok((total, counts))
}

fn sum<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<u64> {
    let mut total = 0u64;
    for addr in 0..vm.len() {
        total += u64::from(vm.read_byte(addr)?);
    }
    Ok(total)
}

/// In-place ascending heapsort of the whole address space.
fn heap_sort<H: FaultHandler>(vm: &mut VirtualMemory<H>) -> Result<()> {
    let len = vm.len();
    for root in (0..len / 2).rev() {
        sift_down(vm, root, len)?;
    }
    for end in (1..len).rev() {
        swap(vm, 0, end)?;
        sift_down(vm, 0, end)?;
    }
    Ok(())
}

fn sift_down<H: FaultHandler>(vm: &mut VirtualMemory<H>, mut root: usize, end: usize) -> Result<()> {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return Ok(());
        }
        if child + 1 < end && vm.read_byte(child)? < vm.read_byte(child + 1)? {
            child += 1;
        }
        if vm.read_byte(root)? >= vm.read_byte(child)? {
            return Ok(());
        }
        swap(vm, root, child)?;
        root = child;
    }
}

fn swap<H: FaultHandler>(vm: &mut VirtualMemory<H>, a: usize, b: usize) -> Result<()> {
    let va = vm.read_byte(a)?;
    let vb = vm.read_byte(b)?;
    vm.write_byte(a, vb)?;
    vm.write_byte(b, va)
}
