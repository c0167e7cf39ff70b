use crate::error::{MonError, Result};

pub const RUN_KEY: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run";
pub const RUN_VALUE: &str = "g14mon";

/// Command line stored in the Run key. Starts the monitor loop quietly.
pub fn autostart_command() -> Result<String> {
    let exe = std::env::current_exe()?;
    Ok(format!("\"{}\" run", exe.display()))
}

/// Registers or unregisters the executable under the per-user Run key.
#[cfg(windows)]
pub fn set_startup(enabled: bool) -> Result<()> {
    use winreg::enums::*;
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let run = hkcu
        .open_subkey_with_flags(RUN_KEY, KEY_READ | KEY_WRITE)
        .map_err(|e| MonError::config(format!("Failed to open Run key: {}", e)))?;

    if enabled {
        let command = autostart_command()?;
        run.set_value(RUN_VALUE, &command)
            .map_err(|e| MonError::config(format!("Failed to write Run value: {}", e)))?;
        log::info!("Registered for startup: {}", command);
    } else {
        match run.delete_value(RUN_VALUE) {
            Ok(()) => log::info!("Removed startup registration"),
            // Already absent
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(MonError::config(format!("Failed to delete Run value: {}", e)));
            }
        }
    }

    Ok(())
}

#[cfg(windows)]
pub fn is_startup_registered() -> bool {
    use winreg::enums::*;
    use winreg::RegKey;

    RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey(RUN_KEY)
        .and_then(|run| run.get_value::<String, _>(RUN_VALUE))
        .is_ok()
}

#[cfg(not(windows))]
pub fn set_startup(_enabled: bool) -> Result<()> {
    Err(MonError::config("Startup registration is only supported on Windows"))
}

#[cfg(not(windows))]
pub fn is_startup_registered() -> bool {
    false
}
