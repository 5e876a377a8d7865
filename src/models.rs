use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTER_LABEL: &str = "New Pokemon";

/// One tracked hunt. A locked counter keeps its pre-lock fields so saving
/// never has to pick the announcement text back apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Counter {
    Active {
        label: String,
        attempts: u64,
    },
    Locked {
        original_label: String,
        original_attempts: u64,
        announcement: String,
    },
}

impl Counter {
    pub fn new(label: impl Into<String>) -> Self {
        Counter::Active {
            label: label.into(),
            attempts: 0,
        }
    }

    pub fn from_record(record: TrackerRecord) -> Self {
        let mut counter = Counter::Active {
            label: record.name,
            attempts: record.count,
        };
        if record.obtained {
            counter.lock();
        }
        counter
    }

    pub fn to_record(&self) -> TrackerRecord {
        match self {
            Counter::Active { label, attempts } => TrackerRecord {
                name: label.clone(),
                count: *attempts,
                obtained: false,
            },
            Counter::Locked {
                original_label,
                original_attempts,
                ..
            } => TrackerRecord {
                name: original_label.clone(),
                count: *original_attempts,
                obtained: true,
            },
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Counter::Locked { .. })
    }

    /// Display text: the editable label while active, the announcement once
    /// locked.
    pub fn display_label(&self) -> &str {
        match self {
            Counter::Active { label, .. } => label,
            Counter::Locked { announcement, .. } => announcement,
        }
    }

    pub fn attempts(&self) -> u64 {
        match self {
            Counter::Active { attempts, .. } => *attempts,
            Counter::Locked {
                original_attempts, ..
            } => *original_attempts,
        }
    }

    pub fn increment(&mut self) {
        if let Counter::Active { attempts, .. } = self {
            *attempts = attempts.saturating_add(1);
        }
    }

    /// Floors at zero: decrementing an empty counter is a no-op.
    pub fn decrement(&mut self) {
        if let Counter::Active { attempts, .. } = self {
            *attempts = attempts.saturating_sub(1);
        }
    }

    pub fn rename(&mut self, new_label: impl Into<String>) {
        if let Counter::Active { label, .. } = self {
            *label = new_label.into();
        }
    }

    /// Terminal transition. The label and attempt count freeze and the
    /// display text becomes the announcement. Locking twice is a no-op.
    pub fn lock(&mut self) {
        if let Counter::Active { label, attempts } = self {
            let original_label = std::mem::take(label);
            let original_attempts = *attempts;
            *self = Counter::Locked {
                announcement: announcement_text(&original_label, original_attempts),
                original_label,
                original_attempts,
            };
        }
    }
}

fn announcement_text(label: &str, attempts: u64) -> String {
    let unit = if attempts == 1 { "try" } else { "tries" };
    format!("Shiny {label} obtained in {attempts} {unit}!")
}

/// One open tab: a named, ordered list of counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub counters: Vec<Counter>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counters: Vec::new(),
        }
    }

    pub fn from_document(document: TabDocument) -> Self {
        Self {
            name: document.tab_name,
            counters: document
                .trackers
                .into_iter()
                .map(Counter::from_record)
                .collect(),
        }
    }

    pub fn to_document(&self) -> TabDocument {
        TabDocument {
            tab_name: self.name.clone(),
            trackers: self.counters.iter().map(Counter::to_record).collect(),
        }
    }

    pub fn add_counter(&mut self, label: impl Into<String>) {
        self.counters.push(Counter::new(label));
    }
}

/// Persisted shape of one saved counter, with the original program's
/// field defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRecord {
    #[serde(default = "default_tracker_name")]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub obtained: bool,
}

fn default_tracker_name() -> String {
    "Error".to_string()
}

/// Persisted shape of one tab file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TabDocument {
    #[serde(default = "default_tab_name")]
    pub tab_name: String,
    #[serde(default)]
    pub trackers: Vec<TrackerRecord>,
}

fn default_tab_name() -> String {
    "Untitled".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewTabRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadTabRequest {
    pub file: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewCounterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameCounterRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CounterView {
    pub label: String,
    pub attempts: u64,
    pub locked: bool,
}

#[derive(Debug, Serialize)]
pub struct TabView {
    pub id: u64,
    pub name: String,
    pub counters: Vec<CounterView>,
}

#[derive(Debug, Serialize)]
pub struct TabsResponse {
    pub selected: Option<u64>,
    pub tabs: Vec<TabView>,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub tab_name: String,
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub tab_name: String,
    pub file_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CounterView {
    pub fn of(counter: &Counter) -> Self {
        Self {
            label: counter.display_label().to_string(),
            attempts: counter.attempts(),
            locked: counter.is_locked(),
        }
    }
}

impl TabView {
    pub fn of(id: u64, collection: &Collection) -> Self {
        Self {
            id,
            name: collection.name.clone(),
            counters: collection.counters.iter().map(CounterView::of).collect(),
        }
    }
}
