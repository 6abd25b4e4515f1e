// ── Dashboard summary ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Entity, EntityType};

/// Headline counts for the landing dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_devices: usize,
    pub online_devices: usize,
    /// Every device that is not online (offline, maintenance, unknown).
    pub offline_devices: usize,
    pub total_branches: usize,
    pub total_customers: usize,
    pub last_updated: DateTime<Utc>,
}

impl DashboardSummary {
    pub fn compute<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut total_devices = 0;
        let mut online_devices = 0;
        let mut total_branches = 0;
        let mut total_customers = 0;

        for entity in entities {
            match entity.entity_type {
                EntityType::Device => {
                    total_devices += 1;
                    let online = entity
                        .metadata
                        .as_device()
                        .and_then(|d| d.status)
                        .is_some_and(|s| s.is_online());
                    if online {
                        online_devices += 1;
                    }
                }
                EntityType::Branch => total_branches += 1,
                EntityType::Customer => total_customers += 1,
                EntityType::Zone | EntityType::Nbg | EntityType::Ro => {}
            }
        }

        Self {
            total_devices,
            online_devices,
            offline_devices: total_devices - online_devices,
            total_branches,
            total_customers,
            last_updated: Utc::now(),
        }
    }

    /// Share of devices online, rounded to a whole percent.
    pub fn online_percentage(&self) -> Option<usize> {
        if self.total_devices == 0 {
            return None;
        }
        Some((self.online_devices * 100 + self.total_devices / 2) / self.total_devices)
    }
}
