//! Unit test harness for the application services.
//!
//! Services are driven through hand-rolled port mocks — no container
//! runtime, no processes.

mod helpers;
mod mocks;

mod compose_service;
mod identity_service;
mod lifecycle_service;
