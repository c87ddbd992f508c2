//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Audit completed (findings may still have been printed)   |
//! | 1    | Findings present and `--strict-exit` given               |
//! | 2    | CLI usage error (bad args, missing path)                 |
//! | 3    | Roster unreadable or in an unsupported format            |
//! | 4    | Roster lacks a required column or has no rows            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError` construction in main.rs

use rosteraudit_recon::ReconError;

/// Success - audit ran to completion.
pub const EXIT_SUCCESS: u8 = 0;

/// Findings present (unmatched, ambiguous or mismatched members) under `--strict-exit`.
/// Like `diff(1)`, exit 1 means "rosters differ."
pub const EXIT_FINDINGS: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Source error - file missing, corrupt workbook, unknown sheet, unsupported extension.
pub const EXIT_SOURCE: u8 = 3;

/// Schema error - a required column is absent or the roster is empty.
pub const EXIT_SCHEMA: u8 = 4;

/// Map an engine/loader error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    if err.is_schema() {
        EXIT_SCHEMA
    } else {
        EXIT_SOURCE
    }
}
