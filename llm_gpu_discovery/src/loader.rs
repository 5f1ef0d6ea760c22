//! The platform dynamic loader, seen as an `open`/`resolve`/`close` capability.
//!
//! [`SystemLoader`] is backed by `libloading`. Anything else implementing
//! [`DynamicLoader`] can stand in for it, which is how the probe is exercised
//! without a vendor driver installed.

use std::{
    ffi::c_void,
    path::{Path, PathBuf},
    ptr::NonNull,
};

#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to open '{path}': {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("symbol '{symbol}' not found: {reason}")]
    Resolve { symbol: String, reason: String },

    #[error("failed to close library: {reason}")]
    Close { reason: String },
}

pub trait DynamicLoader: Send + Sync {
    /// Loads the shared library at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn LibraryHandle>, LoaderError>;
}

/// One open shared library. Dropping it closes the library.
pub trait LibraryHandle: Send {
    /// Address of the exported symbol `symbol`.
    fn resolve(&self, symbol: &str) -> Result<NonNull<c_void>, LoaderError>;

    /// Unloads the library. Nothing resolved from it may be called afterwards.
    fn close(self: Box<Self>) -> Result<(), LoaderError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl DynamicLoader for SystemLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn LibraryHandle>, LoaderError> {
        // SAFETY: loading runs the library's initialisers. Vendor runtimes are
        // built to be dlopen'ed by applications.
        match unsafe { libloading::Library::new(path) } {
            Ok(library) => Ok(Box::new(SystemLibrary { library })),
            Err(e) => Err(LoaderError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

struct SystemLibrary {
    library: libloading::Library,
}

impl LibraryHandle for SystemLibrary {
    fn resolve(&self, symbol: &str) -> Result<NonNull<c_void>, LoaderError> {
        // SAFETY: only the address is read here; the caller decides the type.
        let address = unsafe { self.library.get::<*mut c_void>(symbol.as_bytes()) }
            .map(|s| *s)
            .map_err(|e| LoaderError::Resolve {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;
        NonNull::new(address).ok_or_else(|| LoaderError::Resolve {
            symbol: symbol.to_string(),
            reason: "resolved to a null address".to_string(),
        })
    }

    fn close(self: Box<Self>) -> Result<(), LoaderError> {
        self.library.close().map_err(|e| LoaderError::Close {
            reason: e.to_string(),
        })
    }
}
