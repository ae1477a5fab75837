//! # ratatosk-ssh
//!
//! Thin wrapper around the OpenSSH client binaries. One multiplexed master
//! connection per host (control socket) with a reverse port forward, plus
//! helpers for remote commands, file transfer and key provisioning.
//!
//! Everything here shells out; there is no SSH protocol code. Calls are
//! fail-fast: any non-zero exit surfaces the captured output as the error.

pub mod keys;
pub mod session;

pub use session::SshSession;
