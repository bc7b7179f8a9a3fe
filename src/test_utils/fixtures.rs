use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::error::{Result, SearchError};
use crate::search::{Document, ModuleSource};

/// WAT for `$hash(ptr, len)`: the FNV-1a 4-gram hash of the pure path, for
/// ASCII input, writing 256 normalized `f32`s at offset 0.
macro_rules! fnv_hash_funcs {
    () => {
        r#"
  (func $lower (param $b i32) (result i32)
    (if (result i32)
      (i32.and
        (i32.ge_u (local.get $b) (i32.const 65))
        (i32.le_u (local.get $b) (i32.const 90)))
      (then (i32.add (local.get $b) (i32.const 32)))
      (else (local.get $b))))
  (func $hash (param $ptr i32) (param $len i32)
    (local $i i32) (local $j i32) (local $h i32) (local $slot i32) (local $norm f32)
    (local.set $i (i32.const 0))
    (block $cleared
      (loop $clear
        (br_if $cleared (i32.ge_u (local.get $i) (i32.const 1024)))
        (f32.store (local.get $i) (f32.const 0))
        (local.set $i (i32.add (local.get $i) (i32.const 4)))
        (br $clear)))
    (local.set $i (i32.const 0))
    (block $counted
      (loop $grams
        (br_if $counted (i32.gt_s (i32.add (local.get $i) (i32.const 4)) (local.get $len)))
        (local.set $h (i32.const 0x811c9dc5))
        (local.set $j (i32.const 0))
        (block $hashed
          (loop $gram
            (br_if $hashed (i32.ge_u (local.get $j) (i32.const 4)))
            (local.set $h
              (i32.mul
                (i32.xor
                  (local.get $h)
                  (call $lower
                    (i32.load8_u
                      (i32.add (local.get $ptr) (i32.add (local.get $i) (local.get $j))))))
                (i32.const 16777619)))
            (local.set $j (i32.add (local.get $j) (i32.const 1)))
            (br $gram)))
        (local.set $slot (i32.shl (i32.and (local.get $h) (i32.const 255)) (i32.const 2)))
        (f32.store (local.get $slot) (f32.add (f32.load (local.get $slot)) (f32.const 1)))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $grams)))
    (local.set $norm (f32.const 0))
    (local.set $i (i32.const 0))
    (block $summed
      (loop $sum
        (br_if $summed (i32.ge_u (local.get $i) (i32.const 1024)))
        (local.set $norm
          (f32.add
            (local.get $norm)
            (f32.mul (f32.load (local.get $i)) (f32.load (local.get $i)))))
        (local.set $i (i32.add (local.get $i) (i32.const 4)))
        (br $sum)))
    (local.set $norm (f32.sqrt (local.get $norm)))
    (if (f32.eq (local.get $norm) (f32.const 0))
      (then (local.set $norm (f32.const 1))))
    (local.set $i (i32.const 0))
    (block $scaled
      (loop $scale
        (br_if $scaled (i32.ge_u (local.get $i) (i32.const 1024)))
        (f32.store (local.get $i) (f32.div (f32.load (local.get $i)) (local.get $norm)))
        (local.set $i (i32.add (local.get $i) (i32.const 4)))
        (br $scale))))
"#
    };
}

/// Plain-ABI hasher module. Output lives at offset 0, input at 1024.
pub const NGRAM_HASH_WAT: &str = concat!(
    r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param $len i32) (result i32)
    i32.const 1024)"#,
    fnv_hash_funcs!(),
    r#"
  (func (export "hash_ngrams") (param $ptr i32) (param $len i32) (result i32)
    (call $hash (local.get $ptr) (local.get $len))
    (i32.const 0)))
"#
);

/// Hasher laid out like a wasm-bindgen build of `hash_ngrams(&str) -> Vec<f32>`:
/// a JS glue import, malloc/free, and the result pair written through a
/// shadow-stack `retptr`.
pub const BINDGEN_HASH_WAT: &str = concat!(
    r#"
(module
  (import "wbg" "__wbindgen_throw" (func $throw (param i32 i32)))
  (memory (export "memory") 2)
  (global $sp (mut i32) (i32.const 131072))
  (func (export "__wbindgen_malloc") (param $size i32) (param $align i32) (result i32)
    i32.const 4096)
  (func (export "__wbindgen_free") (param i32 i32 i32))
  (func (export "__wbindgen_add_to_stack_pointer") (param $delta i32) (result i32)
    (global.set $sp (i32.add (global.get $sp) (local.get $delta)))
    (global.get $sp))"#,
    fnv_hash_funcs!(),
    r#"
  (func (export "hash_ngrams") (param $ret i32) (param $ptr i32) (param $len i32)
    ;; a caller that leaks shadow-stack space gets a trap on its next call
    (if (i32.ne (local.get $ret) (i32.const 131056))
      (then unreachable))
    (call $hash (local.get $ptr) (local.get $len))
    (i32.store (local.get $ret) (i32.const 0))
    (i32.store offset=4 (local.get $ret) (i32.const 256))))
"#
);

/// wasm-bindgen layout using a multi-value `hash_ngrams(ptr, len) -> (ptr, len)`.
pub const BINDGEN_MULTIVALUE_HASH_WAT: &str = concat!(
    r#"
(module
  (memory (export "memory") 1)
  (func (export "__wbindgen_malloc") (param i32 i32) (result i32)
    i32.const 4096)
  (func (export "__wbindgen_free") (param i32 i32 i32))"#,
    fnv_hash_funcs!(),
    r#"
  (func (export "hash_ngrams") (param $ptr i32) (param $len i32) (result i32 i32)
    (call $hash (local.get $ptr) (local.get $len))
    (i32.const 0)
    (i32.const 256)))
"#
);

/// wasm-bindgen layout whose result vector has the wrong length.
pub const BINDGEN_SHORT_OUTPUT_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "__wbindgen_malloc") (param i32 i32) (result i32)
    i32.const 4096)
  (func (export "__wbindgen_free") (param i32 i32 i32))
  (func (export "hash_ngrams") (param i32 i32) (result i32 i32)
    (i32.const 0)
    (i32.const 128)))
"#;

/// Well-formed module whose `hash_ngrams` always traps.
pub const TRAPPING_HASH_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "alloc") (param i32) (result i32)
    i32.const 1024)
  (func (export "hash_ngrams") (param i32 i32) (result i32)
    unreachable))
"#;

/// Module exporting memory only.
pub const MISSING_EXPORTS_WAT: &str = r#"
(module
  (memory (export "memory") 1))
"#;

/// In-memory module source that counts fetches.
#[derive(Debug, Clone)]
pub struct StaticSource {
    module: &'static str,
    delay: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(module: &'static str) -> Self {
        Self {
            module,
            delay: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep this long inside every fetch.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared fetch counter; stays valid after the source is boxed.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl ModuleSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.module.as_bytes().to_vec())
    }

    fn describe(&self) -> String {
        "static module".to_string()
    }
}

/// Source whose fetch always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingSource {
    fetches: Arc<AtomicUsize>,
}

impl FailingSource {
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl ModuleSource for FailingSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Err(SearchError::NativeModule("fetch refused".to_string()))
    }

    fn describe(&self) -> String {
        "failing source".to_string()
    }
}

/// Publication-style corpus used across tests and benches.
pub fn sample_documents() -> Vec<Document> {
    [
        ("pub-1", "Antimicrobial peptide engineering for resistant pathogens"),
        ("pub-2", "AAV capsid engineering for liver targeting"),
        ("pub-3", "Nanoparticle delivery system for mRNA therapeutics"),
        ("pub-4", "Protein stability optimization with directed evolution"),
        ("pub-5", "Gene therapy vector design and capsid screening"),
        ("pub-6", "Machine learning models of peptide activity"),
    ]
    .into_iter()
    .map(|(id, text)| Document::new(id, text))
    .collect()
}

/// Temporary directory holding files for CLI tests.
pub struct CorpusFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl CorpusFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    /// Write `docs` as a JSON corpus file and return its path.
    pub fn write_corpus(&self, name: &str, docs: &[Document]) -> PathBuf {
        let body = serde_json::to_string_pretty(docs).expect("Failed to encode corpus");
        self.write_file(name, &body)
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

impl Default for CorpusFixture {
    fn default() -> Self {
        Self::new()
    }
}
