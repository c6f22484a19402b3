//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup; tasks are detached with `tokio::spawn`.

use crate::config::MemorialConfig;
use crate::services::MemorialService;
use chrono::Utc;
use std::time::Duration;

/// Spawn all background tasks.
///
/// The memorial scheduler is idempotent per day, so running it more than
/// once a day only creates what is still missing.
pub fn spawn_all(memorial_service: MemorialService, memorial: &MemorialConfig) {
    if !memorial.enabled {
        log::info!("Memorial scheduler disabled");
        return;
    }

    let interval = Duration::from_secs(memorial.check_interval_secs.max(60));
    tokio::spawn(async move {
        loop {
            let today = Utc::now().date_naive();
            match memorial_service.create_due_memorials(today).await {
                Ok(n) if n > 0 => log::info!("Memorial khatmas scheduled: {n}"),
                Ok(_) => log::debug!("No memorial khatmas due for {today}"),
                Err(e) => log::error!("Failed to create memorial khatmas: {e:?}"),
            }
            tokio::time::sleep(interval).await;
        }
    });
}
