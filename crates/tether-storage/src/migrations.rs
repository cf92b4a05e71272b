// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.

use tether_core::TetherError;
use tracing::debug;

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Apply pending migrations. Refinery records applied versions in
/// `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), TetherError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| TetherError::Storage {
            source: Box::new(e),
        })?;
    debug!(applied = report.applied_migrations().len(), "migrations applied");
    Ok(())
}
