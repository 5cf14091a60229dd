//! Platform capability detection for the credential store.
//!
//! Decides whether `backend = "auto"` can use the system keychain or has to
//! fall back to the file store.

/// Credential storage available on the current platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureStorageCapability {
    /// Keychain, Credential Manager or Secret Service is reachable
    SystemKeyring,
    /// Only file-based storage works (WSL, headless Linux)
    FileBasedKeystore,
    Unsupported,
}

/// Detect the credential storage capability of the current platform.
///
/// - **macOS / iOS / Windows**: `SystemKeyring`
/// - **Linux**: `FileBasedKeystore` under WSL or without a desktop session
///   (DISPLAY + DBUS), `SystemKeyring` otherwise
/// - **Other**: `Unsupported`
pub fn detect_storage_capability() -> SecureStorageCapability {
    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "windows"))]
    {
        return SecureStorageCapability::SystemKeyring;
    }

    #[cfg(target_os = "linux")]
    {
        linux_capability(is_wsl(), has_desktop_environment())
    }

    #[cfg(not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "windows",
        target_os = "linux"
    )))]
    {
        log::error!("Unsupported platform for credential storage");
        SecureStorageCapability::Unsupported
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn linux_capability(wsl: bool, desktop: bool) -> SecureStorageCapability {
    if wsl {
        log::warn!("WSL environment detected. Using file-based credential store");
        return SecureStorageCapability::FileBasedKeystore;
    }
    if desktop {
        log::info!("Linux desktop environment detected. Using system keyring");
        return SecureStorageCapability::SystemKeyring;
    }
    log::warn!("No desktop environment detected. Using file-based credential store");
    SecureStorageCapability::FileBasedKeystore
}

/// WSL shows up in `/proc/version` or through `WSL_DISTRO_NAME`/`WSL_INTEROP`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn is_wsl() -> bool {
    if let Ok(version) = std::fs::read_to_string("/proc/version") {
        if version.contains("Microsoft") || version.contains("WSL") {
            return true;
        }
    }
    std::env::var("WSL_DISTRO_NAME").is_ok() || std::env::var("WSL_INTEROP").is_ok()
}

/// Keyring daemons need both a display and a D-Bus session bus.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn has_desktop_environment() -> bool {
    std::env::var("DISPLAY").is_ok() && std::env::var("DBUS_SESSION_BUS_ADDRESS").is_ok()
}
