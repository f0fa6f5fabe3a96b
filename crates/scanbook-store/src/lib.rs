// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanbook-store — Where books, notes, and their files live.
//
// `LocalStore` keeps records in SQLite, `RemoteStore` talks to the library's
// REST API, and `Library` puts the two together: the remote store is used
// while it answers, and the local one takes over when it does not. Document
// and cover bytes go to the content-addressed `DocumentVault`.

pub mod health;
pub mod library;
pub mod local;
pub mod remote;
pub mod store;
pub mod vault;

pub use health::{CircuitState, RemoteHealth};
pub use library::{ActiveStore, Library};
pub use local::LocalStore;
pub use remote::RemoteStore;
pub use store::BookStore;
pub use vault::{DocumentVault, hash_bytes};
