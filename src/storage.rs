use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::categories::CategoryRegistry;
use crate::error::{Error, Result};
use crate::models::{CategoryDefinition, MaintenanceTask};

/// Where task and category collections live.
///
/// The engine never touches storage itself; callers load a collection,
/// run the engine over it, and save the result.
pub trait Repository {
    fn load(&self) -> Result<Vec<MaintenanceTask>>;
    fn save(&self, tasks: &[MaintenanceTask]) -> Result<()>;
    fn load_categories(&self) -> Result<CategoryRegistry>;
    fn save_categories(&self, categories: &CategoryRegistry) -> Result<()>;
}

/// Returns the data directory.
///
/// The path is determined in the following order:
/// 1. `UPKEEP_DB` environment variable.
/// 2. `~/.local/share/upkeep` (on Linux).
/// 3. `./` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var("UPKEEP_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("upkeep");
        p
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut f = OpenOptions::new().read(true).open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&s)?))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let s = serde_json::to_string_pretty(value)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Stores `records.json` and `categories.json` in one directory.
#[derive(Debug, Clone)]
pub struct JsonRepository {
    dir: PathBuf,
}

impl JsonRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonRepository { dir: dir.into() }
    }

    /// Repository rooted at [`data_dir`].
    pub fn from_env() -> Self {
        JsonRepository::new(data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join("records.json")
    }

    fn categories_path(&self) -> PathBuf {
        self.dir.join("categories.json")
    }

    /// Deletes both data files.
    pub fn delete_all(&self) -> Result<()> {
        for path in [self.records_path(), self.categories_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        info!(dir = %self.dir.display(), "database reset");
        Ok(())
    }
}

impl Repository for JsonRepository {
    fn load(&self) -> Result<Vec<MaintenanceTask>> {
        let path = self.records_path();
        let tasks: Vec<MaintenanceTask> = read_json(&path)?.unwrap_or_default();
        debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    fn save(&self, tasks: &[MaintenanceTask]) -> Result<()> {
        let path = self.records_path();
        write_json(&path, tasks)?;
        debug!(path = %path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }

    fn load_categories(&self) -> Result<CategoryRegistry> {
        let stored: Option<Vec<CategoryDefinition>> = read_json(&self.categories_path())?;
        Ok(stored.map(CategoryRegistry::new).unwrap_or_default())
    }

    fn save_categories(&self, categories: &CategoryRegistry) -> Result<()> {
        write_json(&self.categories_path(), categories.all())
    }
}

/// In-process repository, handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tasks: RefCell<Vec<MaintenanceTask>>,
    categories: RefCell<Option<CategoryRegistry>>,
}

impl MemoryRepository {
    pub fn with_tasks(tasks: Vec<MaintenanceTask>) -> Self {
        MemoryRepository {
            tasks: RefCell::new(tasks),
            categories: RefCell::new(None),
        }
    }
}

impl Repository for MemoryRepository {
    fn load(&self) -> Result<Vec<MaintenanceTask>> {
        Ok(self.tasks.borrow().clone())
    }

    fn save(&self, tasks: &[MaintenanceTask]) -> Result<()> {
        *self.tasks.borrow_mut() = tasks.to_vec();
        Ok(())
    }

    fn load_categories(&self) -> Result<CategoryRegistry> {
        Ok(self.categories.borrow().clone().unwrap_or_default())
    }

    fn save_categories(&self, categories: &CategoryRegistry) -> Result<()> {
        *self.categories.borrow_mut() = Some(categories.clone());
        Ok(())
    }
}

/// A full snapshot of user data.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub records: Vec<MaintenanceTask>,
    #[serde(default)]
    pub categories: Vec<CategoryDefinition>,
    pub export_date: Option<DateTime<Utc>>,
}

/// Writes every task and category in `repo` to `path`.
pub fn export_backup(repo: &dyn Repository, path: &Path, now: DateTime<Utc>) -> Result<Backup> {
    let backup = Backup {
        records: repo.load()?,
        categories: repo.load_categories()?.into_vec(),
        export_date: Some(now),
    };
    write_json(path, &backup)?;
    info!(path = %path.display(), records = backup.records.len(), "backup exported");
    Ok(backup)
}

/// Replaces the contents of `repo` with the backup at `path`.
///
/// A backup without categories keeps the current registry. Backups with
/// repeated task ids are rejected and leave `repo` untouched.
pub fn import_backup(repo: &dyn Repository, path: &Path) -> Result<Backup> {
    let value: serde_json::Value = read_json(path)
        .map_err(|e| Error::InvalidBackup(e.to_string()))?
        .ok_or_else(|| Error::InvalidBackup(format!("{} is empty or missing", path.display())))?;
    if !value.get("records").is_some_and(|r| r.is_array()) {
        return Err(Error::InvalidBackup("missing 'records' array".into()));
    }
    let backup: Backup =
        serde_json::from_value(value).map_err(|e| Error::InvalidBackup(e.to_string()))?;
    let mut seen = HashSet::new();
    if let Some(dup) = backup.records.iter().find(|t| !seen.insert(t.id.as_str())) {
        return Err(Error::InvalidBackup(format!("duplicate task id '{}'", dup.id)));
    }
    repo.save(&backup.records)?;
    if !backup.categories.is_empty() {
        repo.save_categories(&CategoryRegistry::new(backup.categories.clone()))?;
    }
    info!(path = %path.display(), records = backup.records.len(), "backup imported");
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Periodicity;
    use chrono::{NaiveDate, TimeZone};

    fn sample() -> MaintenanceTask {
        MaintenanceTask::new(
            "a1",
            "Gutter",
            "House",
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn json_repository_round_trips_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonRepository::new(dir.path().join("nested"));
        assert!(repo.load().unwrap().is_empty());
        assert_eq!(repo.load_categories().unwrap(), CategoryRegistry::default());

        repo.save(&[sample()]).unwrap();
        assert_eq!(repo.load().unwrap(), vec![sample()]);

        repo.delete_all().unwrap();
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_records_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("records.json"), "{not json").unwrap();
        let repo = JsonRepository::new(dir.path());
        assert!(matches!(repo.load(), Err(Error::Json(_))));
    }

    #[test]
    fn import_rejects_files_without_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        fs::write(&path, r#"{"categories": []}"#).unwrap();
        let repo = MemoryRepository::default();
        assert!(matches!(import_backup(&repo, &path), Err(Error::InvalidBackup(_))));
    }

    const LEGACY_BACKUP: &str = r#"{
        "records": [
            {
                "id": "k3j9x2m1q",
                "name": "Troca de óleo",
                "category": "Veículo",
                "lastDate": "2024-03-01",
                "nextDate": "2024-09-01",
                "periodicity": "6 meses",
                "description": "",
                "cost": 250,
                "notificationsEnabled": true,
                "status": "pending",
                "createdAt": "2024-03-01T12:30:00.000Z",
                "attachments": ["nota-fiscal.pdf"]
            },
            {
                "id": "p0w8z7t4r",
                "name": "Pintura",
                "category": "Casa",
                "lastDate": "2023-11-10",
                "nextDate": "",
                "periodicity": "Personalizado",
                "description": "Fachada",
                "notificationsEnabled": false,
                "status": "completed",
                "createdAt": "2023-11-10T08:00:00.000Z",
                "completedAt": "2023-11-12T17:45:00.000Z"
            }
        ],
        "categories": [
            { "id": "1", "name": "Veículo", "icon": "Car", "color": "bg-blue-100 text-blue-700" },
            { "id": "3", "name": "Casa", "icon": "Home", "color": "bg-emerald-100 text-emerald-700" }
        ],
        "exportDate": "2024-06-01T09:00:00.000Z"
    }"#;

    #[test]
    fn imports_legacy_backup_with_localized_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup_manutencao_2024-06-01.json");
        fs::write(&path, LEGACY_BACKUP).unwrap();
        let repo = JsonRepository::new(dir.path().join("data"));

        let backup = import_backup(&repo, &path).unwrap();
        assert_eq!(backup.records.len(), 2);

        let tasks = repo.load().unwrap();
        let oil = &tasks[0];
        assert_eq!(oil.periodicity, Periodicity::Every6Months);
        assert_eq!(oil.next_date, NaiveDate::from_ymd_opt(2024, 9, 1));
        assert_eq!(oil.cost, Some(250.0));
        assert_eq!(oil.attachments, vec!["nota-fiscal.pdf".to_string()]);

        let paint = &tasks[1];
        assert_eq!(paint.periodicity, Periodicity::Custom);
        assert_eq!(paint.next_date, None);
        assert!(paint.is_completed());
        assert!(!paint.notifications_enabled);

        assert!(repo.load_categories().unwrap().find_by_name("veículo").is_some());

        // Attachments survive a save after the import.
        repo.save(&tasks).unwrap();
        assert_eq!(repo.load().unwrap()[0].attachments, vec!["nota-fiscal.pdf".to_string()]);
    }

    #[test]
    fn import_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        let backup = Backup {
            records: vec![sample(), sample()],
            categories: Vec::new(),
            export_date: None,
        };
        fs::write(&path, serde_json::to_string(&backup).unwrap()).unwrap();

        let repo = MemoryRepository::with_tasks(vec![sample()]);
        let err = import_backup(&repo, &path).unwrap_err();
        assert!(matches!(err, Error::InvalidBackup(msg) if msg.contains("a1")));
        assert_eq!(repo.load().unwrap().len(), 1);
    }
}
