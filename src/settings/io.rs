use std::env::current_exe;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use directories_next::ProjectDirs;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use serde_json;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::OpenOptions;
use std::str;

use crate::settings::types::Settings;
use crate::error::SettingsError;

// creates a path to a settings file in the same directory as the executable
// this could be useful for usb sticks
fn get_portable_settings_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(mut path) => {
            // F:\foo.exe => F:\foo.json
            if !path.set_extension("json") {
                eprintln!("current exe has no filename: {}", path.to_string_lossy());
                return None
            }

            Some(path)
        },
        Err(err) => {
            eprintln!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// creates a path to qtshock-desktop.json in an os dependent standard directory, such as %AppData% on
// windows.
fn get_local_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "qtshock", "qtshock-desktop").map(|dirs| {
        dirs.config_dir().join("qtshock-desktop.json")
    })
}

fn get_settings_path() -> Result<PathBuf, SettingsError> {
    let portable = get_portable_settings_path();
    if let Some(path) = portable {
        let attr = std::fs::metadata(&path);
        match attr {
            Ok(attr) => {
                if attr.is_file() {
                    return Ok(path);
                }
            }
            Err(err) => {
                eprintln!("Could not read metadata of: {}; Using local path instead. ({:?})", path.to_string_lossy(), err);
            },
        }

    }

    match get_local_settings_path() {
        None => Err(SettingsError::NoSettingsPath),
        Some(path) => Ok(path),
    }
}

pub struct SettingsIOLocker {
    rw_lock: RwLock<std::fs::File>,
}

impl SettingsIOLocker {
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<std::fs::File>, SettingsError> {
        match self.rw_lock.try_write() {
            Ok(guard) => Ok(guard),
            Err(source) => {
                return Err(SettingsError::CanNotLock { source });
            },
        }
    }
}

struct SettingsIOInner {
    file: std::fs::File,
}

#[derive(Clone)]
pub struct SettingsIO {
    inner: Arc<Mutex<SettingsIOInner>>,
}

impl SettingsIO {
    pub fn new_sync() -> Result<Self, SettingsError> {
        let path = get_settings_path()?;
        println!("Using settings file {}", path.to_string_lossy());
        SettingsIO::open_sync(path)
    }

    pub fn open_sync(path: PathBuf) -> Result<Self, SettingsError> {
        let directory = path.parent().expect("Failed to determine parent path of settings path");
        std::fs::create_dir_all(directory)?;

        // the file handle is kept open for the lifetime of the application,
        // it doubles as the lock that keeps further instances out.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .append(false)
            .create(true)
            .open(path)?;

        let inner = SettingsIOInner {
            file,
        };
        Ok(SettingsIO { inner: Arc::new(Mutex::new(inner)) })
    }

    pub fn locker(&mut self) -> Result<SettingsIOLocker, SettingsError> {
        let inner = self.inner.lock().expect("Failed to lock SettingsIO inner");

        Ok(SettingsIOLocker {
            rw_lock: RwLock::new(inner.file.try_clone()?),
        })
    }

    // The File returned from here should never be closed!
    fn get_file(&self) -> Result<File, SettingsError> {
        let inner = self.inner.lock().expect("Failed to lock SettingsIO inner");
        let file = inner.file.try_clone()?; // std File
        Ok(File::from_std(file)) // tokio File
    }

    pub async fn read(&self) -> Result<Settings, SettingsError> {
        let mut file = self.get_file()?;
        println!("Reading settings file");

        // cloned handles share one cursor, a save may have left it at the end
        file.rewind().await?;

        let mut content = vec![];
        file.read_to_end(&mut content).await?;

        if content.is_empty() {
            return Ok(Settings::default());
        }

        let content = str::from_utf8(&content)?;

        let settings: Settings = serde_json::from_str(content)?;
        Ok(settings)
    }

    pub async fn save(&self, settings: Settings) -> Result<(), SettingsError> {
        let mut file = self.get_file()?;
        println!("Saving settings");

        let content = serde_json::to_string_pretty(&settings)?;
        file.rewind().await?;
        file.set_len(0).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn locker_keeps_second_instance_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qtshock-desktop.json");

        let mut first = SettingsIO::open_sync(path.clone()).unwrap();
        let mut first_locker = first.locker().unwrap();
        let _guard = first_locker.lock().unwrap();

        let mut second = SettingsIO::open_sync(path).unwrap();
        let mut second_locker = second.locker().unwrap();
        let result = second_locker.lock();
        assert!(matches!(result, Err(SettingsError::CanNotLock { .. })));
    }

    #[tokio::test]
    async fn empty_file_reads_as_default() {
        let dir = tempdir().unwrap();
        let io = SettingsIO::open_sync(dir.path().join("qtshock-desktop.json")).unwrap();

        let settings = io.read().await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn selected_device_survives_a_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qtshock-desktop.json");

        let io = SettingsIO::open_sync(path.clone()).unwrap();
        let settings = Settings {
            selected_device: Some("/dev/ttyACM3".to_string()),
        };
        io.save(settings.clone()).await.unwrap();
        assert_eq!(io.read().await.unwrap(), settings);

        // the key on disk is the historical kebab-case one
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"selected-device\""));

        // a fresh instance on the same path sees the same selection
        drop(io);
        let reopened = SettingsIO::open_sync(path).unwrap();
        assert_eq!(reopened.read().await.unwrap(), settings);
    }
}
