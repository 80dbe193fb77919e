//! Application layer — ports and orchestration services.
//!
//! Services import only from `crate::domain`, `berth_common`, and
//! `self::ports`; all I/O is routed through injected port traits.

pub mod ports;
pub mod services;
