// ABOUTME: Application-wide constants for service identity, limits, and defaults
// ABOUTME: Groups values by concern so tuning knobs live in one place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Application constants grouped by concern

/// Service identity used in logs and health responses
pub mod service_names {
    /// Name reported by the HTTP server
    pub const FORMULADOR_SERVER: &str = "formulador-server";
}

/// Network defaults
pub mod network {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
    /// Default bind address
    pub const DEFAULT_HOST: &str = "127.0.0.1";
    /// Header carrying the authenticated user id, set by the auth layer in front of us
    pub const USER_ID_HEADER: &str = "x-user-id";
}

/// Database defaults
pub mod database {
    /// Default database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/formulador.db";
    /// Default pool size for file-backed databases
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    /// Seconds to wait for a pooled connection
    pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    /// Attempts for a unit of work that hits transient storage errors
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// `SQLite` busy handler timeout in seconds
    pub const BUSY_TIMEOUT_SECS: u64 = 5;
}

/// Result-size limits
pub mod limits {
    /// Maximum ingredient names returned by autocomplete search
    pub const INGREDIENT_SEARCH_LIMIT: i64 = 10;
    /// Default number of reference entries returned by keyword search
    pub const REFERENCE_SEARCH_DEFAULT_LIMIT: i64 = 3;
    /// Reference entries attached as context to a formula report
    pub const REPORT_CONTEXT_LIMIT: i64 = 2;
    /// Upper bound accepted for a caller-supplied reference search limit
    pub const REFERENCE_SEARCH_MAX_LIMIT: i64 = 50;
    /// Keywords of this length or shorter are ignored by reference search
    pub const MIN_KEYWORD_LEN: usize = 2;
}

/// Spanish stopwords dropped from reference library queries
pub const REFERENCE_STOPWORDS: &[&str] = &[
    "a", "con", "cual", "de", "del", "el", "en", "es", "ideal", "la", "las", "los", "o", "para",
    "que", "se", "segun", "sin", "un", "una", "y",
];
