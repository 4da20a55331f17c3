/// The only ref whose pushes are verified.
pub const PROTECTED_REF: &str = "refs/heads/master";

/// Environment variable carrying the module path to verify against.
pub const MODULE_PATH_ENV: &str = "HOME_MODULE_PATH";

pub const GIT_TIMEOUT_ENV: &str = "MODGATE_GIT_TIMEOUT_SECS";

pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 120;

/// A revision of all zeros marks ref creation (old side) or deletion (new side).
pub const ZERO_REVISION: &str = "0000000000000000000000000000000000000000";

/// Number of hex characters of the commit id embedded in a pseudo-version.
pub const SHORT_REVISION_LEN: usize = 12;

pub const LICENSE_FILE: &str = "LICENSE";

pub const MOD_FILE: &str = "go.mod";

pub const VENDOR_DIR: &str = "vendor";

pub const MAX_ZIP_FILE: u64 = 500 << 20;

pub const MAX_FILE_SIZE: u64 = 500 << 20;

pub const MAX_GO_MOD: u64 = 16 << 20;

pub const MAX_LICENSE: u64 = 16 << 20;
