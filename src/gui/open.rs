use tokio::task::spawn_blocking;
use crate::error::LinkOpenError;

/// Opens `url` in the default browser. Anything that is not a plain
/// http(s) link is refused.
pub async fn open_link(url: &str) -> Result<(), LinkOpenError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(LinkOpenError::NotHttp);
    }

    let link = url.to_string();
    spawn_blocking(move || open::that(&link))
        .await
        .expect("Failed to join open_link task")?;

    Ok(())
}
