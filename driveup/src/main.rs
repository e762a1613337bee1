mod config;
mod sync;

use std::io::{self, BufRead};
use std::path::PathBuf;

use drive_core::{DRIVE_SCOPE, DriveClient, TokenClient};

use crate::sync::engine::Updater;
use crate::sync::progress::{STAGE_CONNECT, STAGE_DONE, STAGE_INIT, set_progress};

#[tokio::main]
async fn main() {
    println!("Commencing update, please wait until file synchronization is complete.");
    if let Err(err) = run().await {
        set_progress(STAGE_DONE, &format!("{err:#}"), false);
    }
    println!("\nComplete! <Press enter to quit>");
    // Keep a double-clicked console window open until acknowledged.
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

async fn run() -> anyhow::Result<()> {
    set_progress(STAGE_INIT, "Initialization...", false);
    let (app, key) = config::load_bundled()?;
    set_progress(STAGE_INIT, "Initialization... OK", true);
    if let Some(title) = app.title.as_deref() {
        eprintln!("[driveup] updating {title}");
    }

    set_progress(STAGE_CONNECT, "Connection...", false);
    let token = TokenClient::new(key).authenticate(DRIVE_SCOPE).await?;
    let client = DriveClient::new(token.access_token)?;
    set_progress(STAGE_CONNECT, "Connection... OK", true);

    let updater = Updater::new(client, PathBuf::from("."), process_name())
        .with_root_override(app.root_override().map(str::to_owned))
        .with_max_parallel(app.max_parallel);
    updater.run().await?;
    Ok(())
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_default()
}
