//! Texture manager.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use silkweed_core::task_runner::TaskRunner;
use silkweed_vfs::{AssetSource, normalize};

use crate::entry::{AnyEntry, EntryState, TextureEntry, UploadQueue, request_upload};
use crate::error::GraphicsError;
use crate::types::CpuTexture;

const DEFAULT_WHITE: &str = "__default_white";
const DEFAULT_BLACK: &str = "__default_black";
const DEFAULT_NORMAL: &str = "__default_normal";
const DEFAULT_TRANSPARENT: &str = "__default_transparent";

/// Procedural texture source invoked lazily on first lookup.
pub type TextureFactory = Box<dyn Fn() -> CpuTexture + Send + Sync>;

/// Maps texture identities to GPU entries.
///
/// The identity of an asset texture is its normalized virtual path, so
/// every spelling of one path shares one entry. Lookups that miss create
/// the entry, schedule the decode on the task pool and return immediately;
/// callers bind the placeholder until the upload lands.
///
/// All methods take `&self`: the manager is shared between the logical
/// thread, loader workers and the render thread behind one internal lock.
/// Factories run under that lock and should stay light.
pub struct TextureManager {
    source: Arc<dyn AssetSource>,
    tasks: Arc<TaskRunner>,
    upload_queue: Arc<UploadQueue>,
    entries: Mutex<HashMap<String, Arc<TextureEntry>>>,
    factories: Mutex<HashMap<String, TextureFactory>>,
    white: Arc<TextureEntry>,
    black: Arc<TextureEntry>,
    normal: Arc<TextureEntry>,
    transparent: Arc<TextureEntry>,
}

impl TextureManager {
    pub(crate) fn new(
        source: Arc<dyn AssetSource>,
        tasks: Arc<TaskRunner>,
        upload_queue: Arc<UploadQueue>,
    ) -> Self {
        let mut entries = HashMap::new();
        let mut placeholder = |key: &str, rgba: [u8; 4]| {
            let entry = Arc::new(TextureEntry::from_cpu(
                CpuTexture::solid(rgba).with_label(key),
            ));
            entries.insert(key.to_string(), Arc::clone(&entry));
            request_upload(&upload_queue, AnyEntry::Texture(Arc::clone(&entry)));
            entry
        };

        let white = placeholder(DEFAULT_WHITE, [255, 255, 255, 255]);
        let black = placeholder(DEFAULT_BLACK, [0, 0, 0, 255]);
        let normal = placeholder(DEFAULT_NORMAL, [128, 128, 255, 255]);
        let transparent = placeholder(DEFAULT_TRANSPARENT, [0, 0, 0, 0]);

        Self {
            source,
            tasks,
            upload_queue,
            entries: Mutex::new(entries),
            factories: Mutex::new(HashMap::new()),
            white,
            black,
            normal,
            transparent,
        }
    }

    // --- Lookup & creation ---

    /// Get the entry for a texture identity, creating and scheduling it on
    /// first request.
    ///
    /// Repeated and concurrent calls with any spelling of the same path
    /// return the same entry, and the load is scheduled exactly once.
    pub fn get_or_load(&self, path: &str) -> Result<Arc<TextureEntry>, GraphicsError> {
        let key = normalize(path)?;
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            return Ok(Arc::clone(entry));
        }

        if let Some(factory) = self.factories.lock().get(&key) {
            let entry = Arc::new(TextureEntry::from_cpu(factory().with_label(key.as_str())));
            entries.insert(key, Arc::clone(&entry));
            request_upload(&self.upload_queue, AnyEntry::Texture(Arc::clone(&entry)));
            return Ok(entry);
        }

        let entry = Arc::new(TextureEntry::pending_load(key.as_str()));
        entries.insert(key.clone(), Arc::clone(&entry));
        self.schedule_load(key, Arc::clone(&entry));
        Ok(entry)
    }

    /// Look up an existing entry by identity without creating one.
    pub fn get(&self, path: &str) -> Option<Arc<TextureEntry>> {
        let key = normalize(path).ok()?;
        self.entries.lock().get(&key).map(Arc::clone)
    }

    /// Insert pixels under the label carried by the texture.
    ///
    /// If the identity already exists the entry is updated in place and its
    /// GPU copy becomes outdated; holders of the `Arc` see the new pixels
    /// after the next upload pass.
    pub fn insert(&self, texture: CpuTexture) -> Result<Arc<TextureEntry>, GraphicsError> {
        if texture.label().is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "texture insert requires a label".to_string(),
            ));
        }
        let key = normalize(texture.label())?;
        let texture = texture.with_label(key.as_str());
        let mut entries = self.entries.lock();
        let entry = match entries.get(&key) {
            Some(existing) => {
                existing.set_pending(texture);
                Arc::clone(existing)
            }
            None => {
                let entry = Arc::new(TextureEntry::from_cpu(texture));
                entries.insert(key, Arc::clone(&entry));
                entry
            }
        };
        request_upload(&self.upload_queue, AnyEntry::Texture(Arc::clone(&entry)));
        Ok(entry)
    }

    /// Register a procedural source for an identity.
    ///
    /// The factory is invoked the first time the identity is requested.
    pub fn register_factory(
        &self,
        path: &str,
        factory: impl Fn() -> CpuTexture + Send + Sync + 'static,
    ) -> Result<(), GraphicsError> {
        let key = normalize(path)?;
        self.factories.lock().insert(key, Box::new(factory));
        Ok(())
    }

    // --- Default textures ---

    /// 1x1 white texture, the stand-in for anything not yet uploaded.
    pub fn white(&self) -> &Arc<TextureEntry> {
        &self.white
    }

    /// 1x1 black texture.
    pub fn black(&self) -> &Arc<TextureEntry> {
        &self.black
    }

    /// 1x1 flat normal map.
    pub fn normal(&self) -> &Arc<TextureEntry> {
        &self.normal
    }

    /// 1x1 fully transparent texture.
    pub fn transparent(&self) -> &Arc<TextureEntry> {
        &self.transparent
    }

    // --- Iteration ---

    /// Number of registered entries, placeholders included.
    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Find the identity of an entry by `Arc` pointer.
    pub fn find_name(&self, entry: &Arc<TextureEntry>) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|(_, candidate)| Arc::ptr_eq(candidate, entry))
            .map(|(key, _)| key.clone())
    }

    fn schedule_load(&self, key: String, entry: Arc<TextureEntry>) {
        if !entry
            .core()
            .try_transition(EntryState::Created, EntryState::Loading)
        {
            return;
        }
        let source = Arc::clone(&self.source);
        let queue = Arc::clone(&self.upload_queue);
        self.tasks.run(move || {
            let bytes = match source.read(&key) {
                Ok(bytes) => bytes,
                Err(err) => {
                    entry.core().mark_failed();
                    log::warn!("texture '{key}' failed to load: {err}");
                    return;
                }
            };
            match decode_image(&key, &bytes) {
                Ok(texture) => {
                    entry.set_pending(texture);
                    request_upload(&queue, AnyEntry::Texture(entry));
                }
                Err(err) => {
                    entry.core().mark_failed();
                    log::warn!("{err}");
                }
            }
        });
    }
}

/// Decode image bytes into RGBA8 pixels.
fn decode_image(path: &str, bytes: &[u8]) -> Result<CpuTexture, GraphicsError> {
    let image = image::load_from_memory(bytes).map_err(|err| GraphicsError::ImageDecodeFailed {
        path: path.to_string(),
        reason: err.to_string(),
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    Ok(CpuTexture::rgba8(width, height, rgba.into_raw())?.with_label(path))
}
