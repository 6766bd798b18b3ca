// ─── InterfaceCore ───
// Launcher support core: everything a launcher shell needs before the game
// process can start.
//
// Architecture:
//   asset        — remote→local file bindings + digest algorithms
//   assets       — Mojang asset index model
//   auth         — Yggdrasil + Microsoft identity providers
//   distribution — publisher manifest: servers, modules, Java requirements
//   download     — validated single-file engine + bounded-parallel queue
//   index        — Mojang / distribution index processors
//   java         — discovery, introspection, ranking, remote JDK metadata
//   maven        — coordinate parsing and path derivation
//   repair       — two-phase orchestrator + worker process bridge
//   version      — Mojang version manifest + per-version JSON rules

pub mod asset;
pub mod assets;
pub mod auth;
pub mod distribution;
pub mod download;
pub mod error;
pub mod http;
pub mod index;
pub mod java;
pub mod maven;
pub mod paths;
pub mod repair;
pub mod util;
pub mod version;

pub use asset::{Asset, HashAlgorithm};
pub use error::{CoreError, CoreResult};
pub use paths::LauncherPaths;
