//! Construction-time binding of a loaded vendor library to the probe.
//!
//! Symbols are resolved once, all or nothing. Past this point callers only see
//! [`VendorRuntime`]; raw function pointers never leave this module.

use crate::{
    ffi::{
        FnDeviceGetAttribute, FnDeviceReset, FnDeviceSynchronize, FnDriverGetVersion,
        FnGetDeviceCount, FnGetDeviceProperties, FnMemGetInfo, FnSetDevice, RawProperties,
        RawStatus, STATUS_SUCCESS,
    },
    loader::{LibraryHandle, LoaderError},
    vendors::SymbolNames,
};
use std::ffi::c_int;

/// The device-management surface of one vendor runtime.
///
/// Every method is one vendor call. `Err` carries the raw, unclassified status.
pub trait VendorRuntime: Send {
    fn set_device(&self, device: i32) -> Result<(), RawStatus>;
    fn device_synchronize(&self) -> Result<(), RawStatus>;
    fn device_reset(&self) -> Result<(), RawStatus>;
    /// `(free, total)` in bytes for the selected device.
    fn mem_get_info(&self) -> Result<(u64, u64), RawStatus>;
    fn device_count(&self) -> Result<i32, RawStatus>;
    fn device_attribute(&self, attribute: i32, device: i32) -> Result<i32, RawStatus>;
    fn driver_version(&self) -> Result<i32, RawStatus>;
    /// The struct written by the vendor, read back per its properties ABI.
    fn device_properties(&self, device: i32) -> Result<Box<RawProperties>, RawStatus>;

    /// Unloads the runtime. Consumes it so nothing can be called afterwards.
    fn close(self: Box<Self>) -> Result<(), LoaderError>;
}

#[derive(Clone, Copy)]
struct RuntimeSymbols {
    set_device: FnSetDevice,
    device_synchronize: FnDeviceSynchronize,
    device_reset: FnDeviceReset,
    mem_get_info: FnMemGetInfo,
    get_device_count: FnGetDeviceCount,
    device_get_attribute: FnDeviceGetAttribute,
    driver_get_version: FnDriverGetVersion,
    get_device_properties: FnGetDeviceProperties,
}

/// A required symbol that could not be resolved.
#[derive(Debug)]
pub(crate) struct UnresolvedSymbol {
    pub(crate) symbol: &'static str,
    pub(crate) source: LoaderError,
}

/// SAFETY: `F` must be an `extern "C"` function pointer type matching the
/// symbol's real signature.
unsafe fn resolve_fn<F: Copy>(
    library: &dyn LibraryHandle,
    symbol: &'static str,
) -> Result<F, UnresolvedSymbol> {
    debug_assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<*mut std::ffi::c_void>()
    );
    let address = library
        .resolve(symbol)
        .map_err(|source| UnresolvedSymbol { symbol, source })?;
    Ok(std::mem::transmute_copy::<*mut std::ffi::c_void, F>(
        &address.as_ptr(),
    ))
}

impl RuntimeSymbols {
    fn resolve(library: &dyn LibraryHandle, names: &SymbolNames) -> Result<Self, UnresolvedSymbol> {
        // SAFETY: each alias in `ffi` mirrors the vendor header declaration.
        unsafe {
            Ok(Self {
                set_device: resolve_fn(library, names.set_device)?,
                device_synchronize: resolve_fn(library, names.device_synchronize)?,
                device_reset: resolve_fn(library, names.device_reset)?,
                mem_get_info: resolve_fn(library, names.mem_get_info)?,
                get_device_count: resolve_fn(library, names.get_device_count)?,
                device_get_attribute: resolve_fn(library, names.device_get_attribute)?,
                driver_get_version: resolve_fn(library, names.driver_get_version)?,
                get_device_properties: resolve_fn(library, names.get_device_properties)?,
            })
        }
    }
}

/// A vendor library together with its resolved entry points.
///
/// The library is owned here, so the function pointers cannot outlive it.
pub(crate) struct BoundRuntime {
    symbols: RuntimeSymbols,
    library: Box<dyn LibraryHandle>,
}

impl BoundRuntime {
    /// Resolves every name in `names`. On failure the library is handed back
    /// untouched so the caller can close it.
    pub(crate) fn bind(
        library: Box<dyn LibraryHandle>,
        names: &SymbolNames,
    ) -> Result<Self, (Box<dyn LibraryHandle>, UnresolvedSymbol)> {
        match RuntimeSymbols::resolve(library.as_ref(), names) {
            Ok(symbols) => Ok(Self { symbols, library }),
            Err(e) => Err((library, e)),
        }
    }
}

fn check(status: RawStatus) -> Result<(), RawStatus> {
    if status == STATUS_SUCCESS {
        Ok(())
    } else {
        Err(status)
    }
}

impl VendorRuntime for BoundRuntime {
    fn set_device(&self, device: i32) -> Result<(), RawStatus> {
        check(unsafe { (self.symbols.set_device)(device as c_int) })
    }

    fn device_synchronize(&self) -> Result<(), RawStatus> {
        check(unsafe { (self.symbols.device_synchronize)() })
    }

    fn device_reset(&self) -> Result<(), RawStatus> {
        check(unsafe { (self.symbols.device_reset)() })
    }

    fn mem_get_info(&self) -> Result<(u64, u64), RawStatus> {
        let mut free: usize = 0;
        let mut total: usize = 0;
        check(unsafe { (self.symbols.mem_get_info)(&mut free, &mut total) })?;
        Ok((free as u64, total as u64))
    }

    fn device_count(&self) -> Result<i32, RawStatus> {
        let mut count: c_int = 0;
        check(unsafe { (self.symbols.get_device_count)(&mut count) })?;
        Ok(count)
    }

    fn device_attribute(&self, attribute: i32, device: i32) -> Result<i32, RawStatus> {
        let mut value: c_int = 0;
        check(unsafe { (self.symbols.device_get_attribute)(&mut value, attribute, device) })?;
        Ok(value)
    }

    fn driver_version(&self) -> Result<i32, RawStatus> {
        let mut version: c_int = 0;
        check(unsafe { (self.symbols.driver_get_version)(&mut version) })?;
        Ok(version)
    }

    fn device_properties(&self, device: i32) -> Result<Box<RawProperties>, RawStatus> {
        let mut buffer = RawProperties::new();
        check(unsafe { (self.symbols.get_device_properties)(buffer.as_mut_ptr(), device) })?;
        Ok(buffer)
    }

    fn close(self: Box<Self>) -> Result<(), LoaderError> {
        self.library.close()
    }
}
