//! CLI Exit Code Registry
//!
//! Single source of truth for every exit code `intake` returns. Scripts
//! and schedulers rely on these values.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (I/O, unexpected failure)              |
//! | 2    | Usage error (bad args, missing file)                 |
//! | 3    | Directories were missing and have been created       |
//! | 4    | Inbox empty under `empty_inbox = "abort"`            |
//! | 5    | Configuration file unreadable or invalid             |
//! | 6    | File failed validation or was rejected at submit     |
//!
//! Per-file processing failures inside `run` do not change the exit code;
//! they are reported in the run summary and the processing log.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Bootstrap created missing directories; the run stopped and must be repeated.
pub const EXIT_BOOTSTRAP: u8 = 3;

/// Inbox was empty and the empty-inbox policy is `abort`.
pub const EXIT_EMPTY_INBOX: u8 = 4;

/// `intake.toml` could not be read or parsed.
pub const EXIT_CONFIG: u8 = 5;

/// Validation failed, or one or more submitted files were rejected.
pub const EXIT_REJECTED: u8 = 6;
