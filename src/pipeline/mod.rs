//! Pipeline stages for fetching and sorting images.
//!
//! Each submodule implements exactly one step of a unit of work.
//!
//! ## Data Flow
//!
//! ```text
//! filter ──▶ fetch ──▶ extract ──▶ route
//! (suffix)   (HEAD+GET) (header)   (rename)
//! ```
//!
//! 1. [`filter`]  — keep candidate URLs whose path ends in an allowed extension
//! 2. [`fetch`]   — name, create, probe and stream one URL to disk; drives
//!    the two stages below
//! 3. [`extract`] — read width/height from the header of the declared format;
//!    runs in `spawn_blocking`
//! 4. [`route`]   — rename the file into the horizontal or vertical directory

pub mod extract;
pub mod fetch;
pub mod filter;
pub mod route;
