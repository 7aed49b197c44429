//! Open flags for files and streams.

use bitflags::bitflags;

bitflags! {
    /// How a file should be opened. OS-specific detail is the backend's
    /// problem; engine code is expected to stay in `BINARY`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileOpenMode: u32 {
        // access
        const READ  = 1 << 0;
        const WRITE = 1 << 1;

        // behavior
        const APPEND            = 1 << 2;
        const CREATE_IF_MISSING = 1 << 3;
        const TRUNCATE          = 1 << 4;

        // hint
        const BINARY = 1 << 5;
        const TEXT   = 1 << 6;
    }
}

impl FileOpenMode {
    pub fn can_read(self) -> bool {
        self.contains(FileOpenMode::READ)
    }

    pub fn can_write(self) -> bool {
        self.contains(FileOpenMode::WRITE)
    }

    pub fn is_append(self) -> bool {
        self.contains(FileOpenMode::APPEND)
    }

    /// Any of Write/Append/Truncate/Create counts as a write-side request.
    pub fn wants_write(self) -> bool {
        self.intersects(
            FileOpenMode::WRITE
                | FileOpenMode::APPEND
                | FileOpenMode::TRUNCATE
                | FileOpenMode::CREATE_IF_MISSING,
        )
    }

    /// Rejects combinations that are contradictory regardless of backend:
    /// no access at all, Append+Truncate, Text+Binary, Append without Write.
    pub fn is_valid(self) -> bool {
        if !self.can_read() && !self.can_write() {
            return false;
        }
        if self.contains(FileOpenMode::APPEND | FileOpenMode::TRUNCATE) {
            return false;
        }
        if self.contains(FileOpenMode::TEXT | FileOpenMode::BINARY) {
            return false;
        }
        if self.contains(FileOpenMode::APPEND) && !self.can_write() {
            return false;
        }
        true
    }

    pub fn read_binary() -> Self {
        FileOpenMode::READ | FileOpenMode::BINARY
    }

    pub fn write_binary_truncate(create_if_missing: bool) -> Self {
        let mut m = FileOpenMode::WRITE | FileOpenMode::BINARY | FileOpenMode::TRUNCATE;
        if create_if_missing {
            m |= FileOpenMode::CREATE_IF_MISSING;
        }
        m
    }

    pub fn write_binary_append(create_if_missing: bool) -> Self {
        let mut m = FileOpenMode::WRITE | FileOpenMode::BINARY | FileOpenMode::APPEND;
        if create_if_missing {
            m |= FileOpenMode::CREATE_IF_MISSING;
        }
        m
    }
}
