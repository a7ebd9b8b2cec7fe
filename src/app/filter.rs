// Device list filtering and sorting
//
// Search, status filter and sort order for the device list. Pure functions
// over device slices; the UI asks for the visible rows every frame.

use crate::device::{DeviceStatus, NetworkDevice};
use std::cmp::Ordering;

/// Status filter, cycled with 'f'
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DeviceStatus),
}

impl StatusFilter {
    /// All → online → offline → unknown → All
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Only(DeviceStatus::Online),
            Self::Only(DeviceStatus::Online) => Self::Only(DeviceStatus::Offline),
            Self::Only(DeviceStatus::Offline) => Self::Only(DeviceStatus::Unknown),
            Self::Only(DeviceStatus::Unknown) => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    pub fn matches(self, status: DeviceStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Numeric last octet
    #[default]
    Ip,
    Status,
    Type,
    /// Most recent first in ascending order
    LastSeen,
}

impl SortField {
    pub const ALL: [SortField; 4] = [Self::Ip, Self::Status, Self::Type, Self::LastSeen];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ip => "IP",
            Self::Status => "Status",
            Self::Type => "Type",
            Self::LastSeen => "Activity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

/// Case-insensitive substring match against IP, MAC, hostname and vendor
///
/// An empty query matches everything.
pub fn matches_search(device: &NetworkDevice, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let q = query.to_lowercase();
    device.ip.contains(&q)
        || device.mac.to_lowercase().contains(&q)
        || device
            .hostname
            .as_deref()
            .is_some_and(|h| h.to_lowercase().contains(&q))
        || device
            .vendor
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains(&q))
}

/// Ascending comparison for a sort field
fn compare(a: &NetworkDevice, b: &NetworkDevice, field: SortField) -> Ordering {
    match field {
        // Unparseable addresses sort after every real octet
        SortField::Ip => {
            let octet = |d: &NetworkDevice| d.last_octet().map_or(u16::MAX, u16::from);
            octet(a).cmp(&octet(b))
        }
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::Type => a.device_type.as_str().cmp(b.device_type.as_str()),
        SortField::LastSeen => b.last_seen.cmp(&a.last_seen),
    }
}

/// Search, filter and sort state of the device list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    pub search: String,
    pub status_filter: StatusFilter,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl ListView {
    /// Select a sort field; the active field flips direction, a new one starts ascending
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
    }

    pub fn matches(&self, device: &NetworkDevice) -> bool {
        self.status_filter.matches(device.status) && matches_search(device, &self.search)
    }

    /// Visible rows in display order
    ///
    /// The sort is stable, so equal keys keep their input order in both
    /// directions.
    pub fn apply<'a>(
        &self,
        devices: impl IntoIterator<Item = &'a NetworkDevice>,
    ) -> Vec<&'a NetworkDevice> {
        let mut rows: Vec<&NetworkDevice> = devices.into_iter().filter(|d| self.matches(d)).collect();
        rows.sort_by(|a, b| {
            let ord = compare(a, b, self.sort_field);
            match self.sort_direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        rows
    }

    /// Whether any search or filter is narrowing the list
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || self.status_filter != StatusFilter::All
    }
}
