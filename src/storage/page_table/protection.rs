//! Page protection states.
//!
//! A page moves through: NONE → READ (loaded on first touch) → `READ_WRITE`
//! (first write while resident) → NONE (evicted).

/// Protection bits of a virtual page.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protection {
    /// Not resident; any access faults.
    #[default]
    None = 0,
    /// Resident and clean; writes fault.
    Read = 1,
    /// Resident and possibly modified since load.
    ReadWrite = 3,
}

const READ_BIT: u8 = 1;
const WRITE_BIT: u8 = 2;

/// Kind of memory access being checked against a protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Protection {
    /// Returns whether this protection lets `access` proceed without a fault.
    #[must_use]
    pub fn permits(self, access: Access) -> bool {
        let bits = self as u8;
        match access {
            Access::Read => bits & READ_BIT != 0,
            Access::Write => bits & WRITE_BIT != 0,
        }
    }

    /// Returns whether a page with this protection must be written back on eviction.
    #[must_use]
    pub fn is_dirty(self) -> bool {
        self == Protection::ReadWrite
    }
}

impl std::fmt::Display for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Protection::None => "NONE",
            Protection::Read => "READ",
            Protection::ReadWrite => "READ_WRITE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_none() {
        assert_eq!(Protection::default(), Protection::None);
    }

    #[test]
    fn test_permits() {
        assert!(!Protection::None.permits(Access::Read));
        assert!(!Protection::None.permits(Access::Write));
        assert!(Protection::Read.permits(Access::Read));
        assert!(!Protection::Read.permits(Access::Write));
        assert!(Protection::ReadWrite.permits(Access::Read));
        assert!(Protection::ReadWrite.permits(Access::Write));
    }

    #[test]
    fn test_dirty() {
        assert!(!Protection::None.is_dirty());
        assert!(!Protection::Read.is_dirty());
        assert!(Protection::ReadWrite.is_dirty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Protection::ReadWrite.to_string(), "READ_WRITE");
    }
}
