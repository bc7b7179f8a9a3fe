//! Native n-gram hasher backed by a WebAssembly module.
//!
//! Two module shapes are accepted, both exporting `memory`:
//!
//! - plain: `alloc(len: i32) -> i32` returns an offset where the host may
//!   write `len` bytes; `hash_ngrams(ptr: i32, len: i32) -> i32` hashes the
//!   UTF-8 text at `ptr..ptr+len` and returns the offset of [`DIMS`]
//!   little-endian `f32`s.
//! - wasm-bindgen (`wasm/perf_tools_bg.wasm`): `__wbindgen_malloc(size,
//!   align)`, `__wbindgen_free(ptr, size, align)` and either
//!   `hash_ngrams(retptr, ptr, len)` with `__wbindgen_add_to_stack_pointer`,
//!   or a multi-value `hash_ngrams(ptr, len) -> (ptr, len)`. The returned
//!   vector must hold [`DIMS`] values and is freed after copying.
//!
//! Anything else is rejected at load time so the caller can fall back.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};
use wasmtime::{Engine, Instance, Linker, Memory, Module, Store, TypedFunc};

use crate::error::{Result, SearchError};
use crate::search::embeddings::DIMS;

/// Default asset location of the compiled hasher.
pub const DEFAULT_MODULE_PATH: &str = "wasm/perf_tools_bg.wasm";

/// Where the native module bytes come from.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>>;

    fn describe(&self) -> String;
}

/// Module read from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource(pub PathBuf);

#[async_trait]
impl ModuleSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.0).await?)
    }

    fn describe(&self) -> String {
        self.0.display().to_string()
    }
}

/// Module fetched over HTTP(S).
#[derive(Debug, Clone)]
pub struct UrlSource(pub String);

#[async_trait]
impl ModuleSource for UrlSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = reqwest::Client::new()
            .get(&self.0)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn describe(&self) -> String {
        self.0.clone()
    }
}

/// Pick a source from a config location: `http(s)://` URLs are fetched,
/// everything else is a file path.
pub fn source_from_location(location: &str) -> Box<dyn ModuleSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(UrlSource(location.to_string()))
    } else {
        Box::new(FileSource(PathBuf::from(location)))
    }
}

/// Calling convention of the loaded module.
enum Abi {
    /// `alloc(len) -> ptr` and `hash_ngrams(ptr, len) -> out_ptr`.
    Plain {
        alloc: TypedFunc<i32, i32>,
        hash_ngrams: TypedFunc<(i32, i32), i32>,
    },
    /// wasm-bindgen lowering of `fn hash_ngrams(&str) -> Vec<f32>`.
    Bindgen {
        malloc: TypedFunc<(i32, i32), i32>,
        free: TypedFunc<(i32, i32, i32), ()>,
        hash_ngrams: BindgenReturn,
    },
}

/// How a wasm-bindgen build hands back the `(ptr, len)` of the result.
enum BindgenReturn {
    /// `hash_ngrams(retptr, ptr, len)` writes the pair at `retptr` on the
    /// shadow stack.
    RetPtr {
        hash_ngrams: TypedFunc<(i32, i32, i32), ()>,
        stack_pointer: TypedFunc<i32, i32>,
    },
    /// `hash_ngrams(ptr, len) -> (ptr, len)` with multi-value returns.
    MultiValue(TypedFunc<(i32, i32), (i32, i32)>),
}

const BINDGEN_MALLOC: &str = "__wbindgen_malloc";
const BINDGEN_FREE: &str = "__wbindgen_free";
const BINDGEN_STACK_POINTER: &str = "__wbindgen_add_to_stack_pointer";
const RETPTR_SIZE: i32 = 16;

struct NativeInstance {
    store: Store<()>,
    memory: Memory,
    abi: Abi,
}

/// An instantiated hasher module.
///
/// Calls are serialized through a mutex because a wasm store is single
/// threaded.
pub struct NativeHasher {
    inner: Mutex<NativeInstance>,
}

impl fmt::Debug for NativeHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHasher").finish_non_exhaustive()
    }
}

impl NativeHasher {
    /// Fetch and instantiate the module.
    pub async fn load(source: &dyn ModuleSource) -> Result<Self> {
        let location = source.describe();
        debug!(source = %location, "fetching native hasher module");
        let bytes = source.fetch().await?;
        let hasher = Self::from_bytes(&bytes)?;
        info!(source = %location, bytes = bytes.len(), "native hasher loaded");
        Ok(hasher)
    }

    /// Compile and instantiate from binary (or text) wasm.
    ///
    /// Function imports are linked to stubs that trap when called, so a
    /// wasm-bindgen build instantiates without its JS glue.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(native_error("compile"))?;
        let mut linker = Linker::new(&engine);
        linker
            .define_unknown_imports_as_traps(&module)
            .map_err(native_error("link"))?;
        let mut store = Store::new(&engine, ());
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(native_error("instantiate"))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| SearchError::NativeModule("missing `memory` export".to_string()))?;

        let abi = if instance.get_func(&mut store, BINDGEN_MALLOC).is_some() {
            Self::bindgen_abi(&instance, &mut store)?
        } else {
            Abi::Plain {
                alloc: instance
                    .get_typed_func::<i32, i32>(&mut store, "alloc")
                    .map_err(native_error("export `alloc`"))?,
                hash_ngrams: instance
                    .get_typed_func::<(i32, i32), i32>(&mut store, "hash_ngrams")
                    .map_err(native_error("export `hash_ngrams`"))?,
            }
        };

        Ok(Self {
            inner: Mutex::new(NativeInstance { store, memory, abi }),
        })
    }

    fn bindgen_abi(instance: &Instance, store: &mut Store<()>) -> Result<Abi> {
        let malloc = instance
            .get_typed_func::<(i32, i32), i32>(&mut *store, BINDGEN_MALLOC)
            .map_err(native_error("export `__wbindgen_malloc`"))?;
        let free = instance
            .get_typed_func::<(i32, i32, i32), ()>(&mut *store, BINDGEN_FREE)
            .map_err(native_error("export `__wbindgen_free`"))?;

        let hash_ngrams = if let Ok(hash_ngrams) =
            instance.get_typed_func::<(i32, i32, i32), ()>(&mut *store, "hash_ngrams")
        {
            BindgenReturn::RetPtr {
                hash_ngrams,
                stack_pointer: instance
                    .get_typed_func::<i32, i32>(&mut *store, BINDGEN_STACK_POINTER)
                    .map_err(native_error("export `__wbindgen_add_to_stack_pointer`"))?,
            }
        } else {
            BindgenReturn::MultiValue(
                instance
                    .get_typed_func::<(i32, i32), (i32, i32)>(&mut *store, "hash_ngrams")
                    .map_err(native_error("export `hash_ngrams`"))?,
            )
        };

        Ok(Abi::Bindgen {
            malloc,
            free,
            hash_ngrams,
        })
    }

    /// Whether the module uses the wasm-bindgen calling convention.
    pub fn is_bindgen(&self) -> bool {
        matches!(self.inner.lock().abi, Abi::Bindgen { .. })
    }

    /// Hash `text` inside the module and copy the embedding out.
    pub fn hash(&self, text: &str) -> Result<Vec<f32>> {
        let mut guard = self.inner.lock();
        let NativeInstance { store, memory, abi } = &mut *guard;

        let len = i32::try_from(text.len())
            .map_err(|_| SearchError::NativeModule("input too large".to_string()))?;

        match abi {
            Abi::Plain { alloc, hash_ngrams } => {
                let ptr = alloc.call(&mut *store, len).map_err(native_error("alloc"))?;
                memory
                    .write(&mut *store, offset(ptr), text.as_bytes())
                    .map_err(native_error("write input"))?;
                let out = hash_ngrams
                    .call(&mut *store, (ptr, len))
                    .map_err(native_error("hash_ngrams"))?;
                read_embedding(memory, store, out)
            }
            Abi::Bindgen {
                malloc,
                free,
                hash_ngrams,
            } => {
                // ownership of the input buffer passes to the callee
                let ptr = malloc
                    .call(&mut *store, (len, 1))
                    .map_err(native_error("__wbindgen_malloc"))?;
                memory
                    .write(&mut *store, offset(ptr), text.as_bytes())
                    .map_err(native_error("write input"))?;

                let (out, count) = match hash_ngrams {
                    BindgenReturn::MultiValue(hash_ngrams) => hash_ngrams
                        .call(&mut *store, (ptr, len))
                        .map_err(native_error("hash_ngrams"))?,
                    BindgenReturn::RetPtr {
                        hash_ngrams,
                        stack_pointer,
                    } => {
                        let retptr = stack_pointer
                            .call(&mut *store, -RETPTR_SIZE)
                            .map_err(native_error("stack pointer"))?;
                        let called = hash_ngrams.call(&mut *store, (retptr, ptr, len));
                        let mut pair = [0u8; 8];
                        let read = memory.read(&*store, offset(retptr), &mut pair);
                        stack_pointer
                            .call(&mut *store, RETPTR_SIZE)
                            .map_err(native_error("stack pointer"))?;
                        called.map_err(native_error("hash_ngrams"))?;
                        read.map_err(native_error("read result"))?;
                        (
                            i32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]),
                            i32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]),
                        )
                    }
                };

                let embedding = if usize::try_from(count).ok() == Some(DIMS) {
                    read_embedding(memory, store, out)
                } else {
                    Err(SearchError::NativeModule(format!(
                        "hash_ngrams returned {count} values, expected {DIMS}"
                    )))
                };
                free.call(&mut *store, (out, count.saturating_mul(4), 4))
                    .map_err(native_error("__wbindgen_free"))?;
                embedding
            }
        }
    }
}

fn read_embedding(memory: &Memory, store: &Store<()>, out: i32) -> Result<Vec<f32>> {
    let mut raw = vec![0u8; DIMS * 4];
    memory
        .read(store, offset(out), &mut raw)
        .map_err(native_error("read output"))?;
    Ok(raw
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Wasm pointers are unsigned 32-bit offsets.
#[allow(clippy::cast_sign_loss)]
const fn offset(ptr: i32) -> usize {
    ptr as u32 as usize
}

fn native_error<E: fmt::Display>(stage: &'static str) -> impl Fn(E) -> SearchError {
    move |err| SearchError::NativeModule(format!("{stage}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::embeddings::hash_ngrams;
    use crate::test_utils::fixtures::{
        BINDGEN_HASH_WAT, BINDGEN_MULTIVALUE_HASH_WAT, BINDGEN_SHORT_OUTPUT_WAT,
        MISSING_EXPORTS_WAT, NGRAM_HASH_WAT, TRAPPING_HASH_WAT,
    };

    fn assert_matches_pure(native: &NativeHasher) {
        for text in ["nanoparticle delivery system", "Protein Stability", "abc", ""] {
            let from_module = native.hash(text).unwrap();
            let pure = hash_ngrams(text);
            assert_eq!(from_module.len(), DIMS);
            for (a, b) in from_module.iter().zip(&pure) {
                assert!((a - b).abs() < 1e-6, "mismatch for {text:?}");
            }
        }
    }

    #[test]
    fn module_hash_matches_pure_path_for_ascii() {
        let native = NativeHasher::from_bytes(NGRAM_HASH_WAT.as_bytes()).unwrap();
        assert!(!native.is_bindgen());
        assert_matches_pure(&native);
    }

    #[test]
    fn bindgen_retptr_module_is_accepted() {
        let native = NativeHasher::from_bytes(BINDGEN_HASH_WAT.as_bytes()).unwrap();
        assert!(native.is_bindgen());
        assert_matches_pure(&native);
    }

    #[test]
    fn bindgen_stack_pointer_is_restored_between_calls() {
        let native = NativeHasher::from_bytes(BINDGEN_HASH_WAT.as_bytes()).unwrap();
        let first = native.hash("capsid engineering").unwrap();
        for _ in 0..64 {
            native.hash("liver targeting").unwrap();
        }
        assert_eq!(native.hash("capsid engineering").unwrap(), first);
    }

    #[test]
    fn bindgen_multivalue_module_is_accepted() {
        let native =
            NativeHasher::from_bytes(BINDGEN_MULTIVALUE_HASH_WAT.as_bytes()).unwrap();
        assert!(native.is_bindgen());
        assert_matches_pure(&native);
    }

    #[test]
    fn bindgen_result_of_wrong_length_is_rejected() {
        let native = NativeHasher::from_bytes(BINDGEN_SHORT_OUTPUT_WAT.as_bytes()).unwrap();
        let err = native.hash("anything").unwrap_err();
        assert!(err.to_string().contains("returned 128 values"));
    }

    #[test]
    fn missing_exports_are_rejected() {
        let err = NativeHasher::from_bytes(MISSING_EXPORTS_WAT.as_bytes()).unwrap_err();
        assert!(matches!(err, SearchError::NativeModule(_)));
    }

    #[test]
    fn garbage_bytes_fail_to_compile() {
        let err = NativeHasher::from_bytes(b"\0asm-not-really").unwrap_err();
        assert!(err.to_string().contains("compile"));
    }

    #[test]
    fn trap_surfaces_as_error() {
        let native = NativeHasher::from_bytes(TRAPPING_HASH_WAT.as_bytes()).unwrap();
        let err = native.hash("anything").unwrap_err();
        assert!(err.to_string().contains("hash_ngrams"));
    }

    #[test]
    fn location_picks_source_kind() {
        assert_eq!(
            source_from_location("https://example.org/h.wasm").describe(),
            "https://example.org/h.wasm"
        );
        assert_eq!(
            source_from_location(DEFAULT_MODULE_PATH).describe(),
            DEFAULT_MODULE_PATH
        );
    }

    #[tokio::test]
    async fn missing_file_fails_to_load() {
        let source = FileSource(PathBuf::from("/nonexistent/perf_tools_bg.wasm"));
        let err = NativeHasher::load(&source).await.unwrap_err();
        assert!(matches!(err, SearchError::Io(_)));
    }
}
