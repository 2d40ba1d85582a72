//! Google Cloud and Workspace clients

pub mod auth;
pub mod docs;
pub mod drive;
pub mod vision;

pub use auth::AuthenticationManager;
pub use docs::{DocsClient, DocumentService};
pub use drive::{DriveClient, DriveFile, DriveService};
pub use vision::{GoogleVisionClient, WebDetection, WebDetector};
