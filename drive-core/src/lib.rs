mod auth;
mod client;

pub use auth::{AccessToken, AuthError, Claims, DRIVE_SCOPE, ServiceAccountKey, TokenClient};
pub use client::{DriveClient, DriveError, DriveFile, FOLDER_MIME_TYPE, FileList};
