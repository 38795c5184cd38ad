// ── Registry settings backend ─────────────────────────────────────────────────
//
// Preferences live under `HKCU\SOFTWARE\TextEditor\Settings`, one value per
// setting: REG_SZ for strings, REG_DWORD for numbers.  Reads open the key
// read-only and treat a missing key or value as "not stored"; writes create
// the key on demand.

#![allow(unsafe_code)]

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{ERROR_FILE_NOT_FOUND, WIN32_ERROR},
        System::Registry::{
            RegCloseKey, RegCreateKeyExW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
            HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_DWORD, REG_OPTION_NON_VOLATILE, REG_SZ,
            REG_VALUE_TYPE,
        },
    },
};

use super::dialogs::wide;
use crate::{
    error::{EditorError, Result},
    settings::SettingsBackend,
};

const SETTINGS_KEY: PCWSTR = w!("SOFTWARE\\TextEditor\\Settings");

/// An open registry key, closed on drop.
struct Key(HKEY);

impl Key {
    /// Open for reading.  `Ok(None)` if the key does not exist yet.
    fn open_read() -> Result<Option<Self>> {
        let mut hkey = HKEY::default();
        // SAFETY: SETTINGS_KEY is a static null-terminated string; hkey is a
        // valid out-pointer.
        let status = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, SETTINGS_KEY, 0, KEY_READ, &mut hkey) };
        match status {
            s if s.is_ok() => Ok(Some(Self(hkey))),
            ERROR_FILE_NOT_FOUND => Ok(None),
            s => Err(unavailable("RegOpenKeyExW", s)),
        }
    }

    /// Open for writing, creating the key if needed.
    fn open_write() -> Result<Self> {
        let mut hkey = HKEY::default();
        // SAFETY: as above; the class and security attributes are left null.
        let status = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                SETTINGS_KEY,
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                None,
                &mut hkey,
                None,
            )
        };
        if status.is_err() {
            return Err(unavailable("RegCreateKeyExW", status));
        }
        Ok(Self(hkey))
    }

    /// Read the raw bytes and type of `name`.  `Ok(None)` if absent.
    fn query(&self, name: &str) -> Result<Option<(REG_VALUE_TYPE, Vec<u8>)>> {
        let name = wide(name);
        let mut kind = REG_VALUE_TYPE::default();
        let mut size = 0u32;
        // SAFETY: sizing call; name is null-terminated; kind and size are
        // valid out-pointers and no data buffer is passed.
        let status = unsafe {
            RegQueryValueExW(self.0, PCWSTR(name.as_ptr()), None, Some(&mut kind), None, Some(&mut size))
        };
        match status {
            s if s.is_ok() => {}
            ERROR_FILE_NOT_FOUND => return Ok(None),
            s => return Err(unavailable("RegQueryValueExW", s)),
        }

        let mut data = vec![0u8; size as usize];
        // SAFETY: data holds `size` bytes as reported by the sizing call.
        let status = unsafe {
            RegQueryValueExW(
                self.0,
                PCWSTR(name.as_ptr()),
                None,
                Some(&mut kind),
                Some(data.as_mut_ptr()),
                Some(&mut size),
            )
        };
        if status.is_err() {
            return Err(unavailable("RegQueryValueExW", status));
        }
        data.truncate(size as usize);
        Ok(Some((kind, data)))
    }

    fn set(&self, name: &str, kind: REG_VALUE_TYPE, data: &[u8]) -> Result<()> {
        let name = wide(name);
        // SAFETY: name is null-terminated; data is a live byte slice.
        let status = unsafe { RegSetValueExW(self.0, PCWSTR(name.as_ptr()), 0, kind, Some(data)) };
        if status.is_err() {
            return Err(unavailable("RegSetValueExW", status));
        }
        Ok(())
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        // SAFETY: self.0 was opened by RegOpenKeyExW / RegCreateKeyExW and
        // is closed exactly once.
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

fn unavailable(function: &str, status: WIN32_ERROR) -> EditorError {
    EditorError::SettingsUnavailable(format!("{function} failed (error {})", status.0))
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// `SettingsBackend` over the current user's registry hive.
#[derive(Debug, Default)]
pub(crate) struct RegistryBackend;

impl RegistryBackend {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl SettingsBackend for RegistryBackend {
    fn get_string(&self, name: &str) -> Result<Option<String>> {
        let Some(key) = Key::open_read()? else {
            return Ok(None);
        };
        match key.query(name)? {
            Some((REG_SZ, data)) => Ok(Some(decode_sz(&data))),
            Some((kind, _)) => Err(EditorError::SettingsUnavailable(format!(
                "{name} has registry type {}, expected REG_SZ",
                kind.0
            ))),
            None => Ok(None),
        }
    }

    fn get_u32(&self, name: &str) -> Result<Option<u32>> {
        let Some(key) = Key::open_read()? else {
            return Ok(None);
        };
        match key.query(name)? {
            Some((REG_DWORD, data)) if data.len() == 4 => {
                Ok(Some(u32::from_le_bytes([data[0], data[1], data[2], data[3]])))
            }
            Some(_) => Err(EditorError::SettingsUnavailable(format!("{name} is not a DWORD"))),
            None => Ok(None),
        }
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        let bytes: Vec<u8> = wide(value).iter().flat_map(|u| u.to_le_bytes()).collect();
        Key::open_write()?.set(name, REG_SZ, &bytes)
    }

    fn set_u32(&mut self, name: &str, value: u32) -> Result<()> {
        Key::open_write()?.set(name, REG_DWORD, &value.to_le_bytes())
    }
}

/// Decode REG_SZ bytes: little-endian UTF-16, terminator optional.
fn decode_sz(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_sz_handles_terminator_and_odd_length() {
        let mut data: Vec<u8> = "Consolas".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_sz(&data), "Consolas");
        data.extend_from_slice(&[0, 0, b'x', 0, 7]);
        assert_eq!(decode_sz(&data), "Consolas");
    }
}
