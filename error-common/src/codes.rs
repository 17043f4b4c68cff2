// Stable error codes surfaced to operators and API clients

pub mod import {
    pub const FILE_NOT_FOUND: &str = "IMPORT_1001";
    pub const UNKNOWN_FORMAT: &str = "IMPORT_1002";
    pub const INVALID_JSON: &str = "IMPORT_1003";
    pub const INVALID_SHAPE: &str = "IMPORT_1004";
    pub const UNREADABLE_CSV: &str = "IMPORT_1005";
    pub const STRICT_COERCION: &str = "IMPORT_1006";
    pub const IO_FAILURE: &str = "IMPORT_1007";
}

pub mod claims {
    pub const NOT_FOUND: &str = "CLAIMS_2001";
    pub const INVALID_INPUT: &str = "CLAIMS_2002";
}

pub mod database {
    pub const CONNECTION_FAILED: &str = "DB_4001";
    pub const QUERY_FAILED: &str = "DB_4002";
    pub const MIGRATION_FAILED: &str = "DB_4003";
}

pub mod config {
    pub const INVALID_CONFIG: &str = "CONFIG_5001";
}

pub mod server {
    pub const STARTUP_FAILED: &str = "SERVER_6001";
    pub const INTERNAL: &str = "SERVER_6002";
}
