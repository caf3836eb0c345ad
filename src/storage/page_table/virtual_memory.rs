//! Byte-addressed access to the simulated address space.

use log::trace;

use super::{Access, PageTable};
use crate::error::{Result, VmError};
use crate::storage::page::{page_offset, FrameId, PageId, PAGE_SIZE};

/// A miss followed by a protection upgrade is the longest legal fault chain
/// for a single access.
const MAX_FAULTS_PER_ACCESS: usize = 2;

/// Resolves faults raised by [`VirtualMemory`].
///
/// The handler is installed once and invoked synchronously with the faulting
/// page whenever an access is not permitted by the page's current protection.
/// On return the handler must have changed the page table so the access can
/// make progress.
pub trait FaultHandler {
    /// Resolves a fault on `page`.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the access that raised the fault.
    fn handle_fault(&mut self, table: &mut PageTable, page: PageId) -> Result<()>;
}

impl<F> FaultHandler for F
where
    F: FnMut(&mut PageTable, PageId) -> Result<()>,
{
    fn handle_fault(&mut self, table: &mut PageTable, page: PageId) -> Result<()> {
        self(table, page)
    }
}

/// Virtual address space of `page_count * PAGE_SIZE` bytes.
pub struct VirtualMemory<H> {
    table: PageTable,
    handler: H,
}

impl<H: FaultHandler> VirtualMemory<H> {
    /// Installs `handler` as the fault handler for `table`.
    pub fn new(table: PageTable, handler: H) -> Self {
        Self { table, handler }
    }

    /// Returns the size of the address space in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.page_count() * PAGE_SIZE
    }

    /// Returns whether the address space is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the byte at `addr`, faulting it in if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if `addr` is out of range or fault handling fails.
    pub fn read_byte(&mut self, addr: usize) -> Result<u8> {
        let frame = self.resolve(addr, Access::Read)?;
        Ok(self.table.frame_data(frame)?[page_offset(addr)])
    }

    /// Writes `value` at `addr`, faulting the page in and upgrading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if `addr` is out of range or fault handling fails.
    pub fn write_byte(&mut self, addr: usize, value: u8) -> Result<()> {
        let frame = self.resolve(addr, Access::Write)?;
        self.table.frame_data_mut(frame)?[page_offset(addr)] = value;
        Ok(())
    }

    /// Returns the page table.
    #[must_use]
    pub fn table(&self) -> &PageTable {
        &self.table
    }

    /// Returns the installed fault handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the installed fault handler for modification.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Splits the address space into its page table and fault handler.
    pub fn into_parts(self) -> (PageTable, H) {
        (self.table, self.handler)
    }

    /// Faults `addr` in until `access` is permitted; returns the frame holding it.
    fn resolve(&mut self, addr: usize, access: Access) -> Result<FrameId> {
        if addr >= self.len() {
            return Err(VmError::AddressOutOfRange {
                addr,
                len: self.len(),
            });
        }

        let page = PageId::containing(addr);
        let mut faults = 0;
        loop {
            let entry = self.table.entry(page)?;
            if entry.protection.permits(access) {
                return Ok(entry.frame);
            }

            if faults == MAX_FAULTS_PER_ACCESS {
                return Err(VmError::InvariantViolation(format!(
                    "{access:?} access to {page} still not permitted after {faults} faults (protection {})",
                    entry.protection
                )));
            }
            trace!("{access:?} fault at {addr:#x} on {page}");
            self.handler.handle_fault(&mut self.table, page)?;
            faults += 1;
        }
    }
}
