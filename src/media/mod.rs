//! Media pipeline: fetch, re-encode, upload and record images.
//!
//! - [`ImageFetcher`] - download source bytes
//! - [`ImageEncoder`] - JPEG plus blurhash, on the blocking pool
//! - [`AssetStore`] - remote object store, one per [`StoreSlot`](crate::models::StoreSlot)
//! - [`MediaPipeline`] - orchestrates the above and owns media records

mod encode;
mod fetch;
mod imagekit;
mod pipeline;
mod store;

pub use encode::{EncodedImage, ImageEncoder, JpegBlurhashEncoder};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use imagekit::{name_query, ImageKitStore};
pub use pipeline::{MediaCleanup, MediaPipeline};
pub use store::{AssetStore, AssetStores, RemoteFile};
