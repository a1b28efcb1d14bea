use crate::config::{ensure_config_dir, get_db_file_path};
use crate::error::{QuickTextError, Result};
use crate::models::{normalize_keyword, now_rfc3339, ShortcutEntry, DEFAULT_CATEGORY};
use crate::snapshot::ShortcutSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Shortcuts written to a fresh database.
pub const DEFAULT_SHORTCUTS: &[(&str, &str, &str)] = &[
    ("tady", "Thank you very much in advance.", "Thanks"),
    ("tassist", "Thank you for your assistance.", "Thanks"),
    ("tcontact", "Thank you very much for contacting us.", "Thanks"),
    ("tcoop", "Thank you very much for your cooperation.", "Thanks"),
    ("temail", "Thank you for the e-mail.", "Thanks"),
    ("hello", "Hello, how can I help you today?", "Greetings"),
    ("bye", "Thank you and have a great day!", "Closing"),
];

/// Layout of an export file.
#[derive(Serialize, Deserialize, Debug)]
pub struct ExportData {
    pub shortcuts: Vec<ImportRecord>,
    #[serde(default)]
    pub exported_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImportRecord {
    pub keyword: String,
    pub phrase: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub usage_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageStatistics {
    pub total_shortcuts: usize,
    pub total_expansions: u64,
    pub top: Vec<ShortcutEntry>,
}

/// Keyword → phrase database persisted as a JSON array.
#[derive(Debug)]
pub struct ShortcutStore {
    path: PathBuf,
    entries: Vec<ShortcutEntry>,
}

impl ShortcutStore {
    /// Open the store at the default location, creating it if needed.
    pub fn open_default() -> Result<Self> {
        ensure_config_dir()?;
        Self::open(get_db_file_path())
    }

    /// Load the store at `path`. A missing or empty file is seeded with the default shortcuts.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            let mut store = Self {
                path,
                entries: Vec::new(),
            };
            store.seed_defaults();
            store.save()?;
            log::info!(
                "Created shortcut database with {} defaults at {}",
                store.entries.len(),
                store.path.display()
            );
            return Ok(store);
        }

        Ok(Self {
            entries: parse_entries(&content)?,
            path,
        })
    }

    /// Load the store at `path` without ever seeding it. A missing or empty file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Err(QuickTextError::InvalidConfig(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self {
            entries: parse_entries(&content)?,
            path,
        })
    }

    /// Replace the in-memory entries with what is currently on disk.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = Self::load(self.path.clone())?.entries;
        Ok(())
    }

    fn seed_defaults(&mut self) {
        self.entries = DEFAULT_SHORTCUTS
            .iter()
            .map(|(keyword, phrase, category)| {
                ShortcutEntry::new(keyword.to_string(), phrase.to_string(), category.to_string())
            })
            .collect();
        self.entries.sort_by(|a, b| a.keyword.cmp(&b.keyword));
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save shortcuts to the database file.
    ///
    /// The file is replaced by renaming a fully written sibling, so readers never see it half written.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let serialized = serde_json::to_string_pretty(&self.entries)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(serialized.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| QuickTextError::Io(e.error))?;
        Ok(())
    }

    /// All shortcuts, sorted by keyword
    pub fn all(&self) -> &[ShortcutEntry] {
        &self.entries
    }

    pub fn find(&self, keyword: &str) -> Option<&ShortcutEntry> {
        let keyword = keyword.trim().to_lowercase();
        self.entries.iter().find(|entry| entry.keyword == keyword)
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        let keyword = keyword.trim().to_lowercase();
        self.entries.iter().position(|entry| entry.keyword == keyword)
    }

    fn insert_sorted(&mut self, entry: ShortcutEntry) {
        let at = self
            .entries
            .binary_search_by(|probe| probe.keyword.cmp(&entry.keyword))
            .unwrap_or_else(|at| at);
        self.entries.insert(at, entry);
    }

    /// Add a new shortcut
    pub fn add(&mut self, keyword: &str, phrase: &str, category: &str) -> Result<&ShortcutEntry> {
        let keyword = normalize_keyword(keyword)?;
        if self.find(&keyword).is_some() {
            return Err(QuickTextError::DuplicateKeyword(keyword));
        }

        let entry = ShortcutEntry::new(keyword.clone(), phrase.to_string(), category_or_default(category));
        self.insert_sorted(entry);
        self.save()?;
        log::info!("Added shortcut '{}'", keyword);

        self.find(&keyword)
            .ok_or_else(|| QuickTextError::ShortcutNotFound(keyword))
    }

    /// Edit an existing shortcut. `None` leaves a field unchanged.
    pub fn update(
        &mut self,
        keyword: &str,
        new_keyword: Option<&str>,
        phrase: Option<&str>,
        category: Option<&str>,
    ) -> Result<()> {
        let index = self
            .position(keyword)
            .ok_or_else(|| QuickTextError::ShortcutNotFound(keyword.to_string()))?;

        let renamed = match new_keyword {
            Some(new_keyword) => {
                let new_keyword = normalize_keyword(new_keyword)?;
                if new_keyword != self.entries[index].keyword && self.find(&new_keyword).is_some() {
                    return Err(QuickTextError::DuplicateKeyword(new_keyword));
                }
                Some(new_keyword)
            }
            None => None,
        };

        let mut entry = self.entries.remove(index);
        if let Some(new_keyword) = renamed {
            entry.keyword = new_keyword;
        }
        if let Some(phrase) = phrase {
            entry.phrase = phrase.to_string();
        }
        if let Some(category) = category {
            entry.category = category_or_default(category);
        }
        entry.touch();
        log::info!("Updated shortcut '{}'", entry.keyword);
        self.insert_sorted(entry);

        self.save()
    }

    /// Delete a shortcut by keyword
    pub fn delete(&mut self, keyword: &str) -> Result<()> {
        let index = self
            .position(keyword)
            .ok_or_else(|| QuickTextError::ShortcutNotFound(keyword.to_string()))?;
        let removed = self.entries.remove(index);
        log::info!("Deleted shortcut '{}'", removed.keyword);
        self.save()
    }

    /// Bump the usage counter. Unknown keywords are ignored.
    pub fn increment_usage(&mut self, keyword: &str) -> Result<()> {
        match self.position(keyword) {
            Some(index) => {
                self.entries[index].usage_count += 1;
                self.save()
            }
            None => {
                log::warn!("Usage recorded for unknown shortcut '{}'", keyword);
                Ok(())
            }
        }
    }

    /// Unique category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Case-insensitive substring match on keyword or phrase, optionally restricted to a category.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<&ShortcutEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                query.is_empty()
                    || entry.keyword.contains(&query)
                    || entry.phrase.to_lowercase().contains(&query)
            })
            .filter(|entry| category.map_or(true, |category| entry.category == category))
            .collect()
    }

    /// Read-only keyword → phrase view for the expansion engine.
    pub fn snapshot(&self) -> ShortcutSnapshot {
        ShortcutSnapshot::from_entries(&self.entries)
    }

    pub fn statistics(&self, limit: usize) -> UsageStatistics {
        let mut top: Vec<ShortcutEntry> = self.entries.clone();
        top.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        top.truncate(limit);

        UsageStatistics {
            total_shortcuts: self.entries.len(),
            total_expansions: self.entries.iter().map(|entry| entry.usage_count).sum(),
            top,
        }
    }

    /// Write every shortcut to `path` as JSON
    pub fn export(&self, path: &Path) -> Result<()> {
        let data = ExportData {
            shortcuts: self
                .entries
                .iter()
                .map(|entry| ImportRecord {
                    keyword: entry.keyword.clone(),
                    phrase: entry.phrase.clone(),
                    category: Some(entry.category.clone()),
                    usage_count: entry.usage_count,
                })
                .collect(),
            exported_at: Some(now_rfc3339()),
        };
        fs::write(path, serde_json::to_string_pretty(&data)?)?;
        log::info!("Exported {} shortcuts to {}", data.shortcuts.len(), path.display());
        Ok(())
    }

    /// Insert or replace shortcuts from an export file. Returns how many were imported.
    pub fn import(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        let data: ExportData = serde_json::from_str(&content)?;

        let mut imported = 0;
        for record in data.shortcuts {
            let keyword = match normalize_keyword(&record.keyword) {
                Ok(keyword) => keyword,
                Err(e) => {
                    log::warn!("Skipping import record: {}", e);
                    continue;
                }
            };

            let category = category_or_default(record.category.as_deref().unwrap_or(""));
            match self.position(&keyword) {
                Some(index) => {
                    let entry = &mut self.entries[index];
                    entry.phrase = record.phrase;
                    entry.category = category;
                    entry.usage_count = record.usage_count;
                    entry.touch();
                }
                None => {
                    let mut entry = ShortcutEntry::new(keyword, record.phrase, category);
                    entry.usage_count = record.usage_count;
                    self.insert_sorted(entry);
                }
            }
            imported += 1;
        }

        self.save()?;
        log::info!("Imported {} shortcuts from {}", imported, path.display());
        Ok(imported)
    }
}

fn parse_entries(content: &str) -> Result<Vec<ShortcutEntry>> {
    let mut entries: Vec<ShortcutEntry> = serde_json::from_str(content)?;
    entries.sort_by(|a, b| a.keyword.cmp(&b.keyword));
    Ok(entries)
}

fn category_or_default(category: &str) -> String {
    let category = category.trim();
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.to_string()
    }
}
