use std::{io::ErrorKind, path::Path};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

/// Reads the whole file under a shared lock. A missing file is reported as `None`.
pub async fn read_locked(path: &Path) -> Result<Option<String>> {
    async fn extract(path: &Path) -> std::result::Result<String, std::io::Error> {
        debug!("Reading {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result.map(|_| contents)
    }

    match extract(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e)?,
    }
}

/// Replaces the contents of a file under an exclusive lock. `update` receives the current
/// contents (if any) and returns the new ones, so read-modify-write happens without another
/// process slipping in between.
pub async fn update_locked(
    path: &Path,
    update: impl FnOnce(Option<String>) -> Result<String>,
) -> Result<()> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .read(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = rewrite_with_file(&mut file, update).await;
    file.unlock_async().await?;
    result
}

async fn rewrite_with_file(
    file: &mut File,
    update: impl FnOnce(Option<String>) -> Result<String>,
) -> Result<()> {
    let mut previous = String::new();
    file.read_to_string(&mut previous).await?;
    let previous = if previous.is_empty() {
        None
    } else {
        Some(previous)
    };

    let next = update(previous)?;

    file.rewind().await?;
    file.set_len(0).await?;
    file.write_all(next.as_bytes()).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{read_locked, update_locked};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("missing")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("store");

        update_locked(&path, |previous| {
            assert_eq!(previous, None);
            Ok("first".into())
        })
        .await?;

        assert_eq!(read_locked(&path).await?.as_deref(), Some("first"));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_longer_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("store");

        update_locked(&path, |_| Ok("a much longer first value".into())).await?;
        update_locked(&path, |previous| {
            assert_eq!(previous.as_deref(), Some("a much longer first value"));
            Ok("short".into())
        })
        .await?;

        assert_eq!(read_locked(&path).await?.as_deref(), Some("short"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_update_keeps_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("store");

        update_locked(&path, |_| Ok("kept".into())).await?;
        let result = update_locked(&path, |_| Err(anyhow::anyhow!("refused"))).await;

        assert!(result.is_err());
        assert_eq!(read_locked(&path).await?.as_deref(), Some("kept"));
        Ok(())
    }
}
