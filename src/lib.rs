pub mod bundle;
pub mod config;
pub mod downloader;
pub mod error;
pub mod hub;
pub mod logging;
pub mod model_id;
pub mod verify;
pub mod writer;

pub use bundle::{ArtifactBundle, BundleFile};
pub use config::{FetchConfig, Overrides};
pub use downloader::{fetch_and_save, ArtifactFetcher, FetchReport};
pub use error::FetchError;
pub use hub::{ArtifactSource, HubSource, Listing};
pub use model_id::ModelId;
pub use verify::{verify_dir, VerifyReport};
pub use writer::SavedFile;
