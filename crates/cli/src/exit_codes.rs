//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `lenswatch` exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Description                                        |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 2    | CLI usage error (bad args, unknown source name)    |
//! | 3    | Invalid config (parse or validation failure)       |
//! | 4    | Runtime error (unreadable file, bad CSV, output)   |
//! | 5    | `resolve`: at least one title left unresolved      |
//!
//! Unresolved listings during `run` are reported in the summary and never
//! change the exit code.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code on its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Config file did not parse or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// IO or data error while running.
pub const EXIT_RUNTIME: u8 = 4;

/// `lenswatch resolve` could not resolve every title it was given.
pub const EXIT_UNRESOLVED: u8 = 5;
