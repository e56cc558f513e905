//! In-memory collaborators for end-to-end migration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};

use docshift::config::Config;
use docshift::context::Context;
use docshift::db::Row;
use docshift::error::AppError;
use docshift::legacy::{IdRange, LegacySource, MappingColumns};
use docshift::media::{AssetStore, AssetStores, EncodedImage, ImageEncoder, ImageFetcher, RemoteFile};
use docshift::models::{EntityKind, MAPPING_COLUMN, MEDIA_IDS_COLUMN};
use docshift::remote::{ArticleBody, RemoteContentApi};
use docshift::store::{field_path, DocumentStore};

// ============================================================================
// Legacy source
// ============================================================================

type Columns = HashMap<String, JsonValue>;

#[derive(Default)]
pub struct FakeLegacy {
    rows: Mutex<HashMap<(EntityKind, i64), Columns>>,
    authors: Mutex<HashMap<i64, Vec<i64>>>,
    categories: Mutex<HashMap<i64, Vec<i64>>>,
    tags: Mutex<HashMap<(EntityKind, i64), Vec<i64>>>,
    pub fail_listing: AtomicBool,
}

impl FakeLegacy {
    pub fn insert(&self, kind: EntityKind, id: i64, columns: JsonValue) {
        let mut row: Columns = serde_json::from_value(columns).unwrap();
        row.entry(kind.legacy_table().key.to_string())
            .or_insert(json!(id));
        row.entry(MAPPING_COLUMN.to_string()).or_insert(json!(""));
        if kind.tracks_media() {
            row.entry(MEDIA_IDS_COLUMN.to_string()).or_insert(json!(""));
        }
        self.rows.lock().unwrap().insert((kind, id), row);
    }

    pub fn set_authors(&self, post_id: i64, users: Vec<i64>) {
        self.authors.lock().unwrap().insert(post_id, users);
    }

    pub fn set_categories(&self, post_id: i64, leaves: Vec<i64>) {
        self.categories.lock().unwrap().insert(post_id, leaves);
    }

    pub fn set_tags(&self, kind: EntityKind, post_id: i64, tags: Vec<i64>) {
        self.tags.lock().unwrap().insert((kind, post_id), tags);
    }

    pub fn mapped(&self, kind: EntityKind, id: i64) -> String {
        self.column(kind, id, MAPPING_COLUMN)
    }

    pub fn media(&self, id: i64) -> String {
        self.column(EntityKind::Article, id, MEDIA_IDS_COLUMN)
    }

    /// Points a mapping at an arbitrary ID without touching documents.
    pub fn force_mapping(&self, kind: EntityKind, id: i64, mapped: &str) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&(kind, id)) {
            row.insert(MAPPING_COLUMN.to_string(), json!(mapped));
        }
    }

    fn column(&self, kind: EntityKind, id: i64, column: &str) -> String {
        self.rows
            .lock()
            .unwrap()
            .get(&(kind, id))
            .and_then(|r| r.get(column))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    fn mapped_all(&self, kind: EntityKind, ids: &[i64]) -> Vec<String> {
        ids.iter().map(|id| self.mapped(kind, *id)).collect()
    }
}

#[async_trait]
impl LegacySource for FakeLegacy {
    async fn list_ids(&self, kind: EntityKind, range: IdRange) -> Result<Vec<i64>, AppError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AppError::Pool("legacy database unavailable".to_string()));
        }
        let mut ids: Vec<i64> = self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, id)| *k == kind && range.contains(*id))
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch_record(&self, kind: EntityKind, legacy_id: i64) -> Result<Option<Row>, AppError> {
        let row = self.rows.lock().unwrap().get(&(kind, legacy_id)).cloned();
        Ok(row.map(|mut columns| {
            if kind == EntityKind::LiveRecord {
                let company = columns
                    .get("company_id")
                    .and_then(|v| v.as_i64())
                    .map(|c| self.mapped(EntityKind::Company, c))
                    .unwrap_or_default();
                columns.insert("company_mapped_id".to_string(), json!(company));
            }
            Row::new(columns)
        }))
    }

    async fn article_author_ids(&self, post_id: i64) -> Result<Vec<String>, AppError> {
        let users = self.authors.lock().unwrap().get(&post_id).cloned();
        Ok(self.mapped_all(EntityKind::User, &users.unwrap_or_default()))
    }

    async fn article_category_numbers(&self, post_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .get(&post_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn article_tag_ids(&self, kind: EntityKind, post_id: i64) -> Result<Vec<String>, AppError> {
        let tags = self.tags.lock().unwrap().get(&(kind, post_id)).cloned();
        Ok(self.mapped_all(kind, &tags.unwrap_or_default()))
    }

    async fn article_editor_ids(
        &self,
        _post_id: i64,
    ) -> Result<(Option<String>, Option<String>), AppError> {
        Ok((None, None))
    }

    async fn issue_article_ids(
        &self,
        post_ids: &[i64],
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        Ok(self
            .mapped_all(EntityKind::Article, post_ids)
            .into_iter()
            .filter(|id| !id.is_empty())
            .collect())
    }

    async fn post_mapped_ids(&self, post_ids: &[i64]) -> Result<Vec<String>, AppError> {
        self.issue_article_ids(post_ids, Utc::now(), Utc::now()).await
    }

    async fn read_mapping(
        &self,
        kind: EntityKind,
        legacy_id: i64,
    ) -> Result<Option<MappingColumns>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&(kind, legacy_id)).map(|row| MappingColumns {
            mapped_id: row
                .get(MAPPING_COLUMN)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            media_ids: row
                .get(MEDIA_IDS_COLUMN)
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }))
    }

    async fn mapped_legacy_ids(&self, kind: EntityKind, mapped_id: &str) -> Result<Vec<i64>, AppError> {
        let rows = self.rows.lock().unwrap();
        let mut ids: Vec<i64> = rows
            .iter()
            .filter(|((k, _), row)| {
                *k == kind && row.get(MAPPING_COLUMN).and_then(|v| v.as_str()) == Some(mapped_id)
            })
            .map(|((_, id), _)| *id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn write_mapping(
        &self,
        kind: EntityKind,
        legacy_id: i64,
        columns: &MappingColumns,
    ) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&(kind, legacy_id)) else {
            return Ok(0);
        };
        row.insert(MAPPING_COLUMN.to_string(), json!(columns.mapped_id));
        if let Some(media) = &columns.media_ids {
            row.insert(MEDIA_IDS_COLUMN.to_string(), json!(media));
        }
        Ok(1)
    }

    async fn clear_all_mappings(&self, kind: EntityKind) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let mut cleared = 0;
        for ((k, _), row) in rows.iter_mut() {
            if *k != kind {
                continue;
            }
            row.insert(MAPPING_COLUMN.to_string(), json!(""));
            if kind.tracks_media() {
                row.insert(MEDIA_IDS_COLUMN.to_string(), json!(""));
            }
            cleared += 1;
        }
        Ok(cleared)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

// ============================================================================
// Document store
// ============================================================================

#[derive(Default)]
pub struct MemoryDocuments {
    collections: Mutex<BTreeMap<String, BTreeMap<String, JsonValue>>>,
    rejected_updates: Mutex<Vec<String>>,
}

fn field_text(body: &JsonValue, path: &str) -> Option<String> {
    let mut current = body;
    for key in field_path(path) {
        current = current.get(&key)?;
    }
    match current {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl MemoryDocuments {
    /// Makes every update to `collection` fail until re-enabled.
    pub fn reject_updates(&self, collection: &str, reject: bool) {
        let mut rejected = self.rejected_updates.lock().unwrap();
        rejected.retain(|c| c != collection);
        if reject {
            rejected.push(collection.to_string());
        }
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, |c| c.len())
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<JsonValue> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    pub fn all(&self, collection: &str) -> Vec<JsonValue> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn seed(&self, collection: &str, body: JsonValue) {
        let id = body["id"].as_str().unwrap().to_string();
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id, body);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn insert(&self, collection: &str, id: &str, body: JsonValue) -> Result<(), AppError> {
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(AppError::Query {
                message: format!("duplicate key {}/{}", collection, id),
                query: "INSERT".to_string(),
            });
        }
        docs.insert(id.to_string(), body);
        Ok(())
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<JsonValue>, AppError> {
        Ok(self.get(collection, id))
    }

    async fn find_many(&self, collection: &str, ids: &[String]) -> Result<Vec<JsonValue>, AppError> {
        Ok(ids.iter().filter_map(|id| self.get(collection, id)).collect())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        path: &str,
        value: &str,
    ) -> Result<Vec<JsonValue>, AppError> {
        Ok(self
            .all(collection)
            .into_iter()
            .filter(|body| field_text(body, path).as_deref() == Some(value))
            .collect())
    }

    async fn update(&self, collection: &str, id: &str, patch: JsonValue) -> Result<bool, AppError> {
        if self.rejected_updates.lock().unwrap().iter().any(|c| c == collection) {
            return Err(AppError::Query {
                message: format!("update rejected for {}", collection),
                query: "UPDATE".to_string(),
            });
        }
        let mut collections = self.collections.lock().unwrap();
        let Some(body) = collections.get_mut(collection).and_then(|c| c.get_mut(id)) else {
            return Ok(false);
        };
        if let (Some(target), JsonValue::Object(patch)) = (body.as_object_mut(), patch) {
            target.extend(patch);
        }
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let mut collections = self.collections.lock().unwrap();
        Ok(collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .is_some())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<u64, AppError> {
        let mut removed = 0;
        for id in ids {
            if self.delete(collection, id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_where(
        &self,
        collection: &str,
        path: &str,
        value: &str,
    ) -> Result<Vec<String>, AppError> {
        let ids: Vec<String> = self
            .find_by_field(collection, path, value)
            .await?
            .iter()
            .filter_map(|b| b["id"].as_str().map(str::to_string))
            .collect();
        self.delete_many(collection, &ids).await?;
        Ok(ids)
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        Ok(self.get(collection, id).is_some())
    }

    async fn push_to_array(
        &self,
        collection: &str,
        ids: &[String],
        field: &str,
        value: JsonValue,
    ) -> Result<u64, AppError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut touched = 0;
        for id in ids {
            if let Some(body) = docs.get_mut(id) {
                let slot = &mut body[field];
                if !slot.is_array() {
                    *slot = json!([]);
                }
                if let Some(items) = slot.as_array_mut() {
                    items.push(value.clone());
                }
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn pull_from_array(
        &self,
        collection: &str,
        field: &str,
        value: JsonValue,
    ) -> Result<u64, AppError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut touched = 0;
        for body in docs.values_mut() {
            if let Some(items) = body.get_mut(field).and_then(|v| v.as_array_mut()) {
                let before = items.len();
                items.retain(|item| *item != value);
                if items.len() != before {
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default())
    }
}

// ============================================================================
// Media collaborators
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_id: String,
    pub name: String,
    pub folder: String,
    pub tags: Vec<String>,
}

#[derive(Default)]
pub struct MemoryAssets {
    files: Mutex<Vec<StoredFile>>,
    next_id: AtomicUsize,
}

impl MemoryAssets {
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|f| format!("{}{}", f.folder, f.name))
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl AssetStore for MemoryAssets {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
        tags: &[String],
    ) -> Result<RemoteFile, AppError> {
        let file_id = format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut files = self.files.lock().unwrap();
        files.retain(|f| !(f.name == file_name && f.folder == folder));
        files.push(StoredFile {
            file_id: file_id.clone(),
            name: file_name.to_string(),
            folder: folder.to_string(),
            tags: tags.to_vec(),
        });
        Ok(RemoteFile {
            file_id,
            name: file_name.to_string(),
            file_path: format!("{}{}", folder, file_name),
        })
    }

    async fn list_by_name(&self, names: &[String]) -> Result<Vec<RemoteFile>, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| names.contains(&f.name))
            .map(|f| RemoteFile {
                file_id: f.file_id.clone(),
                name: f.name.clone(),
                file_path: format!("{}{}", f.folder, f.name),
            })
            .collect())
    }

    async fn delete_by_id(&self, file_id: &str) -> Result<(), AppError> {
        self.files.lock().unwrap().retain(|f| f.file_id != file_id);
        Ok(())
    }

    async fn bulk_delete(&self, file_ids: &[String]) -> Result<(), AppError> {
        self.files
            .lock()
            .unwrap()
            .retain(|f| !file_ids.contains(&f.file_id));
        Ok(())
    }

    async fn delete_folder(&self, folder: &str) -> Result<(), AppError> {
        self.files
            .lock()
            .unwrap()
            .retain(|f| !f.folder.starts_with(folder));
        Ok(())
    }
}

/// Serves fixed bytes; URLs containing "broken" fail like a dropped connection.
#[derive(Default)]
pub struct FakeFetcher {
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if url.contains("broken") {
            return Err(AppError::TransientIo(format!("connection reset: {}", url)));
        }
        Ok(vec![0xFF, 0xD8, 0xFF])
    }
}

pub struct FakeEncoder;

#[async_trait]
impl ImageEncoder for FakeEncoder {
    async fn encode(&self, source: Vec<u8>) -> Result<EncodedImage, AppError> {
        Ok(EncodedImage {
            bytes: source,
            blurhash: "LEHV6nWB2yk8pyo0adR*.7kCMdnj".to_string(),
            width: 8,
            height: 8,
        })
    }
}

#[derive(Default)]
pub struct FakeContentApi {
    bodies: Mutex<HashMap<i64, ArticleBody>>,
}

impl FakeContentApi {
    pub fn insert(&self, legacy_id: i64, content: JsonValue, featured_image: Option<&str>) {
        self.bodies.lock().unwrap().insert(
            legacy_id,
            ArticleBody {
                content,
                featured_image: featured_image.map(str::to_string),
            },
        );
    }
}

#[async_trait]
impl RemoteContentApi for FakeContentApi {
    async fn fetch_article_body(&self, legacy_id: i64) -> Result<ArticleBody, AppError> {
        self.bodies
            .lock()
            .unwrap()
            .get(&legacy_id)
            .cloned()
            .ok_or_else(|| AppError::TransientIo(format!("no body for post {}", legacy_id)))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn test_config() -> Config {
    let store = json!({ "private_key": "private_test" });
    serde_json::from_value(json!({
        "legacy": { "uri": "postgresql://localhost/legacy" },
        "target": { "uri": "postgresql://localhost/target" },
        "content_api": { "base_url": "https://old.example.org" },
        "assets": { "archive_a": store, "archive_b": store, "active": store },
        "media": {
            "archive_source": "https://archive.example.org/uploads",
            "active_source": "https://active.example.org/",
            "default_author_name": "Editorial Board",
            "default_author_id": "editorial"
        },
        "rewrite": {
            "legacy_hosts": ["http://old.example.org/"],
            "canonical_host": "https://assets.example.org/"
        },
        "users": { "primary_domain": "gmail.com", "institute_domain": "example.edu" }
    }))
    .unwrap()
}

pub struct Harness {
    pub ctx: Context,
    pub legacy: Arc<FakeLegacy>,
    pub documents: Arc<MemoryDocuments>,
    pub archive: Arc<MemoryAssets>,
    pub active: Arc<MemoryAssets>,
    pub content: Arc<FakeContentApi>,
    pub fetcher: Arc<FakeFetcher>,
}

impl Harness {
    pub fn new() -> Self {
        let legacy = Arc::new(FakeLegacy::default());
        let documents = Arc::new(MemoryDocuments::default());
        let archive = Arc::new(MemoryAssets::default());
        let active = Arc::new(MemoryAssets::default());
        let content = Arc::new(FakeContentApi::default());
        let fetcher = Arc::new(FakeFetcher::default());

        let ctx = Context {
            legacy: legacy.clone(),
            documents: documents.clone(),
            assets: AssetStores::new(
                archive.clone(),
                Arc::new(MemoryAssets::default()),
                active.clone(),
            ),
            content_api: content.clone(),
            fetcher: fetcher.clone(),
            encoder: Arc::new(FakeEncoder),
            config: Arc::new(test_config()),
        };

        Self {
            ctx,
            legacy,
            documents,
            archive,
            active,
            content,
            fetcher,
        }
    }

    /// Seeds categories 1 (root) and 12 (child of 1).
    pub fn seed_categories(&self) {
        self.documents
            .seed("categories", json!({ "id": "cat-1", "number": 1, "name": "News" }));
        self.documents.seed(
            "categories",
            json!({
                "id": "cat-12", "number": 12, "name": "Campus",
                "parent": { "number": 1, "reference": "cat-1" }
            }),
        );
    }

    pub fn add_user(&self, id: i64, login: &str, email: &str) {
        self.legacy.insert(
            EntityKind::User,
            id,
            json!({
                "user_login": login,
                "user_email": email,
                "user_display_name": format!("User {}", id),
                "user_display_picture": "",
            }),
        );
    }

    pub fn add_tag(&self, kind: EntityKind, id: i64, text: &str) {
        self.legacy
            .insert(kind, id, json!({ "tag_id": id, "tag_text": text }));
    }

    pub fn add_article(&self, id: i64, title: &str) {
        self.legacy.insert(
            EntityKind::Article,
            id,
            json!({
                "post_title": title,
                "post_excerpt": "In short",
                "post_publish_status": 0,
                "restrict_to_lan": 0,
                "post_hits": 10,
                "post_comment_count": 1,
                "post_created": "2019-03-04 10:20:30",
                "post_modified": "0000-00-00 00:00:00",
            }),
        );
    }
}
