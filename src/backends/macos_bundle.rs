//! Runtime bundle identifier for macOS UNUserNotificationCenter
//!
//! UserNotifications refuses to work for a process without
//! `NSBundle.mainBundle.bundleIdentifier`. Applications shipped as `.app`
//! bundles already have one from their Info.plist. Unbundled binaries
//! (cargo run/test, CLI hosts) get the configured identifier set in memory
//! through a private LaunchServices call.

use std::ffi::c_void;

use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use objc2_foundation::NSBundle;

/// Returns the process bundle identifier, setting `fallback_id` first if the
/// process has none.
pub fn ensure_bundle_identifier(fallback_id: &str) -> Result<String, BundleError> {
    let main_bundle = NSBundle::mainBundle();
    if let Some(existing_id) = main_bundle.bundleIdentifier() {
        return Ok(existing_id.to_string());
    }

    tracing::debug!(bundle_id = %fallback_id, "Process has no bundle identifier, setting one");
    set_bundle_identifier_via_private_api(fallback_id)?;

    let main_bundle = NSBundle::mainBundle();
    main_bundle
        .bundleIdentifier()
        .map(|id| id.to_string())
        .ok_or(BundleError::VerificationFailed)
}

/// Sets the bundle identifier with `_LSSetApplicationInformationItem` from
/// LaunchServices, a private API also used by Chromium for the same purpose.
fn set_bundle_identifier_via_private_api(bundle_id: &str) -> Result<(), BundleError> {
    unsafe {
        unsafe extern "C" {
            fn dlopen(filename: *const i8, flag: i32) -> *mut c_void;
            fn dlsym(handle: *mut c_void, symbol: *const i8) -> *mut c_void;
            fn dlclose(handle: *mut c_void) -> i32;
        }

        const RTLD_LAZY: i32 = 1;
        const RTLD_GLOBAL: i32 = 8;

        let framework_path =
            c"/System/Library/Frameworks/CoreServices.framework/CoreServices".as_ptr();
        let framework_handle = dlopen(framework_path, RTLD_LAZY | RTLD_GLOBAL);
        if framework_handle.is_null() {
            return Err(BundleError::FrameworkNotFound);
        }

        let function_ptr = dlsym(framework_handle, c"_LSSetApplicationInformationItem".as_ptr());
        if function_ptr.is_null() {
            dlclose(framework_handle);
            return Err(BundleError::FunctionNotFound);
        }

        // OSStatus _LSSetApplicationInformationItem(int, CFTypeRef, CFStringRef, CFTypeRef, CFDictionaryRef)
        type LSSetAppInfoFn = unsafe extern "C" fn(
            i32,
            *const c_void,
            CFStringRef,
            *const c_void,
            *const c_void,
        ) -> i32;

        let set_app_info: LSSetAppInfoFn = std::mem::transmute(function_ptr);

        let key = CFString::new("CFBundleIdentifier");
        let value = CFString::new(bundle_id);

        // kLSDefaultSessionID = -2, NULL item = current process
        let status = set_app_info(
            -2,
            std::ptr::null(),
            key.as_concrete_TypeRef(),
            value.as_concrete_TypeRef() as *const c_void,
            std::ptr::null(),
        );

        dlclose(framework_handle);

        if status == 0 {
            Ok(())
        } else {
            Err(BundleError::CallFailed(status))
        }
    }
}

/// Errors that can occur during bundle setup
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("LaunchServices framework not found")]
    FrameworkNotFound,
    #[error("_LSSetApplicationInformationItem function not found")]
    FunctionNotFound,
    #[error("_LSSetApplicationInformationItem failed with OSStatus {0}")]
    CallFailed(i32),
    #[error("bundle identifier still missing after setting it")]
    VerificationFailed,
}
