//! C-compatible FFI API for cross-language callers.
//!
//! # ABI Contract
//!
//! All exported functions use the `extern "C"` calling convention and
//! `#[no_mangle]` symbol names. The header is generated into
//! `include/report_forge.h` by `build.rs`.
//!
//! ## Memory management
//! - Buffers and strings returned through out-parameters are allocated on the
//!   Rust heap. Free them with `rf_free_buffer` / `rf_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! Fallible functions return a `c_int`:
//!
//! | code | meaning |
//! |---|---|
//! | 0 | success |
//! | 1 | null pointer argument |
//! | 2 | input is not UTF-8 |
//! | 3 | report failed validation |
//! | 4 | export failed |
//!
//! Details are available from `rf_last_error` on the same thread.
//!
//! ## Usage from Go (cgo)
//! ```go
//! // #cgo LDFLAGS: -lreport_forge
//! // #include "report_forge.h"
//! import "C"
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::assets::fetcher_for;
use crate::engine::ForgeEngine;
use crate::error::ForgeError;
use crate::export::{export_pdf, preview_html};
use crate::settings::Settings;

pub const RF_OK: c_int = 0;
pub const RF_ERR_NULL: c_int = 1;
pub const RF_ERR_UTF8: c_int = 2;
pub const RF_ERR_VALIDATION: c_int = 3;
pub const RF_ERR_EXPORT: c_int = 4;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg.replace('\0', " ")).ok();
    });
}

fn fail(err: &ForgeError) -> c_int {
    set_last_error(&err.to_string());
    match err {
        ForgeError::Validation(_) => RF_ERR_VALIDATION,
        ForgeError::Export(_) => RF_ERR_EXPORT,
    }
}

/// Optional runtime settings for [`rf_preview_html`] and [`rf_export_pdf`].
/// Pass `NULL` for the defaults.
#[repr(C)]
pub struct RfSettings {
    /// Fetch remote images (`true`) or treat them as unavailable.
    pub remote_assets: bool,
    /// Null-terminated URL of the utility stylesheet, or `NULL` for the
    /// default.
    pub utility_css_href: *const c_char,
}

/// # Safety
/// `cfg.utility_css_href`, if non-null, must be a valid null-terminated string.
unsafe fn settings_from_c(cfg: *const RfSettings) -> Settings {
    let mut settings = Settings::default();
    if cfg.is_null() {
        return settings;
    }
    let cfg = &*cfg;
    settings.remote_assets = cfg.remote_assets;
    if !cfg.utility_css_href.is_null() {
        if let Ok(href) = CStr::from_ptr(cfg.utility_css_href).to_str() {
            settings.utility_css_href = href.to_string();
        }
    }
    settings
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
unsafe fn input<'a>(ptr: *const u8, len: u32) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        RF_ERR_UTF8
    })
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Validate a report document and render its preview HTML.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `cfg` is null or points to a valid [`RfSettings`].
/// - `out_html` must be a valid pointer; free `*out_html` with `rf_free_string`.
#[no_mangle]
pub unsafe extern "C" fn rf_preview_html(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const RfSettings,
    out_html: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_html.is_null() {
        set_last_error("Null pointer argument");
        return RF_ERR_NULL;
    }
    let json = match input(json_ptr, json_len) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let settings = settings_from_c(cfg);

    match preview_html(json, &settings, today()) {
        Ok(html) => match CString::new(html) {
            Ok(cs) => {
                *out_html = cs.into_raw();
                RF_OK
            }
            Err(_) => {
                set_last_error("Preview contained a null byte");
                RF_ERR_EXPORT
            }
        },
        Err(e) => fail(&e),
    }
}

/// Export a report document to PDF with the built-in engine.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `cfg` is null or points to a valid [`RfSettings`].
/// - `out_buf`, `out_len` must be valid pointers; free `*out_buf` with
///   `rf_free_buffer`.
/// - `out_filename` is null or a valid pointer; free `*out_filename` with
///   `rf_free_string`.
#[no_mangle]
pub unsafe extern "C" fn rf_export_pdf(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const RfSettings,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_filename: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return RF_ERR_NULL;
    }
    let json = match input(json_ptr, json_len) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let settings = settings_from_c(cfg);
    let fetcher = fetcher_for(&settings);
    let engine = ForgeEngine::new();

    match export_pdf(json, &settings, &*fetcher, &engine, today()) {
        Ok(output) => {
            let len = output.bytes.len() as u32;
            let buf = output.bytes.into_boxed_slice();
            *out_buf = Box::into_raw(buf) as *mut u8;
            *out_len = len;
            if !out_filename.is_null() {
                *out_filename = match CString::new(output.filename) {
                    Ok(cs) => cs.into_raw(),
                    Err(_) => ptr::null_mut(),
                };
            }
            RF_OK
        }
        Err(e) => fail(&e),
    }
}

/// Free a buffer returned by `rf_export_pdf`.
///
/// # Safety
/// `buf` and `len` must come from the same `rf_export_pdf` call.
#[no_mangle]
pub unsafe extern "C" fn rf_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned through an out-parameter.
///
/// # Safety
/// `s` must have been produced by this library.
#[no_mangle]
pub unsafe extern "C" fn rf_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// The last error message on this thread, or null. Valid until the next
/// `rf_*` call on the same thread. Do not free.
#[no_mangle]
pub extern "C" fn rf_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cs) => cs.as_ptr(),
        None => ptr::null(),
    })
}

/// Library version. Do not free.
#[no_mangle]
pub extern "C" fn rf_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples;

    fn last_error() -> String {
        let p = rf_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    #[test]
    fn preview() {
        let json = samples::minimal().as_bytes();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { rf_preview_html(json.as_ptr(), json.len() as u32, ptr::null(), &mut out) };
        assert_eq!(rc, RF_OK);
        let html = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        assert!(html.contains("Minimal Report"));
        unsafe { rf_free_string(out) };
    }

    #[test]
    fn preview_with_custom_stylesheet() {
        let json = samples::minimal().as_bytes();
        let href = CString::new("/static/utilities.css").unwrap();
        let cfg = RfSettings {
            remote_assets: false,
            utility_css_href: href.as_ptr(),
        };
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { rf_preview_html(json.as_ptr(), json.len() as u32, &cfg, &mut out) };
        assert_eq!(rc, RF_OK);
        let html = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        assert!(html.contains("/static/utilities.css"));
        unsafe { rf_free_string(out) };
    }

    #[test]
    fn export() {
        let json = samples::minimal().as_bytes();
        let cfg = RfSettings {
            remote_assets: false,
            utility_css_href: ptr::null(),
        };
        let mut buf: *mut u8 = ptr::null_mut();
        let mut len: u32 = 0;
        let mut name: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            rf_export_pdf(json.as_ptr(), json.len() as u32, &cfg, &mut buf, &mut len, &mut name)
        };
        assert_eq!(rc, RF_OK);
        let bytes = unsafe { slice::from_raw_parts(buf, len as usize) };
        assert_eq!(&bytes[..5], b"%PDF-");
        let filename = unsafe { CStr::from_ptr(name) }.to_str().unwrap();
        assert_eq!(filename, "Minimal-Report.pdf");
        unsafe {
            rf_free_buffer(buf, len);
            rf_free_string(name);
        }
    }

    #[test]
    fn validation_failure() {
        let json = br#"{"components":[]}"#;
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { rf_preview_html(json.as_ptr(), json.len() as u32, ptr::null(), &mut out) };
        assert_eq!(rc, RF_ERR_VALIDATION);
        assert!(out.is_null());
        assert!(last_error().contains("components"));
    }

    #[test]
    fn null_and_bad_utf8() {
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { rf_preview_html(ptr::null(), 0, ptr::null(), &mut out) };
        assert_eq!(rc, RF_ERR_NULL);

        let bad = [0xff_u8, 0xfe];
        let rc = unsafe { rf_preview_html(bad.as_ptr(), 2, ptr::null(), &mut out) };
        assert_eq!(rc, RF_ERR_UTF8);
        assert!(last_error().starts_with("Invalid UTF-8"));
    }

    #[test]
    fn version() {
        let v = unsafe { CStr::from_ptr(rf_version()) }.to_str().unwrap();
        assert_eq!(v, env!("CARGO_PKG_VERSION"));
    }
}
