use std::fmt;

/// The two asset categories an item's document can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// The `.swf` animation resource, described by `hotelData.swf`.
    Swf,
    /// The icon image, described by `hotelData.icon`.
    Icon,
}

impl AssetKind {
    /// Key of this kind's descriptor inside `hotelData`.
    pub fn descriptor_key(self) -> &'static str {
        match self {
            AssetKind::Swf => "swf",
            AssetKind::Icon => "icon",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Swf => write!(f, "SWF"),
            AssetKind::Icon => write!(f, "Icon"),
        }
    }
}

/// What happened to one asset of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOutcome {
    Downloaded,
    AlreadyPresent,
    Failed,
    /// The descriptor is missing, reports `exists = false`, or has no URL.
    NotAvailable,
}

/// Per-kind download counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCounters {
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl AssetCounters {
    pub fn record(&mut self, outcome: AssetOutcome) {
        match outcome {
            AssetOutcome::Downloaded => self.downloaded += 1,
            AssetOutcome::AlreadyPresent => self.already_present += 1,
            AssetOutcome::Failed => self.failed += 1,
            AssetOutcome::NotAvailable => {}
        }
    }
}

/// Summary of an asset download run.
#[derive(Debug, Clone, Default)]
pub struct AssetReport {
    /// Item directories visited.
    pub items: usize,
    pub swf: AssetCounters,
    pub icon: AssetCounters,
    /// Item directories without a `data.json`.
    pub missing_documents: usize,
    /// Documents that could not be read or parsed.
    pub document_errors: usize,
}

impl AssetReport {
    pub fn counters_mut(&mut self, kind: AssetKind) -> &mut AssetCounters {
        match kind {
            AssetKind::Swf => &mut self.swf,
            AssetKind::Icon => &mut self.icon,
        }
    }

    /// Total failures across both kinds and unreadable documents.
    pub fn error_count(&self) -> usize {
        self.swf.failed + self.icon.failed + self.document_errors
    }
}
