use std::process;

use log::debug;

pub const CONSOLE_PREFIX: &str = "Fatal error in launcher";
pub const DIALOG_TITLE: &str = "Fatal Error in Launcher";

/// How long the error dialog stays up, in milliseconds.
#[cfg(windows)]
pub const DIALOG_TIMEOUT_MS: u32 = 3000;

/// Report `err` to the user and exit with code 1.
pub fn fatal(err: &anyhow::Error, gui: bool) -> ! {
    let message = format!("{err:#}");
    debug!("giving up: {}", message);
    if gui {
        show_dialog(&message);
    } else {
        eprintln!("{CONSOLE_PREFIX}: {message}");
    }
    process::exit(1)
}

#[cfg(windows)]
fn show_dialog(message: &str) {
    use std::ptr::null_mut;
    use windows_sys::core::PCWSTR;
    use windows_sys::Win32::Foundation::HWND;
    use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};
    use windows_sys::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK, MB_SETFOREGROUND};

    type MessageBoxTimeoutW = unsafe extern "system" fn(HWND, PCWSTR, PCWSTR, u32, u16, u32) -> i32;

    let text: Vec<u16> = message.encode_utf16().chain(Some(0)).collect();
    let caption: Vec<u16> = DIALOG_TITLE.encode_utf16().chain(Some(0)).collect();
    let style = MB_OK | MB_SETFOREGROUND | MB_ICONERROR;

    unsafe {
        // The timed variant is exported by user32 but not declared in the SDK headers.
        let user32 = LoadLibraryA(b"user32.dll\0".as_ptr());
        let timed = if user32.is_null() {
            None
        } else {
            GetProcAddress(user32, b"MessageBoxTimeoutW\0".as_ptr())
        };
        match timed {
            Some(proc) => {
                let timed: MessageBoxTimeoutW = std::mem::transmute(proc);
                timed(null_mut(), text.as_ptr(), caption.as_ptr(), style, 0, DIALOG_TIMEOUT_MS);
            }
            None => {
                MessageBoxW(null_mut(), text.as_ptr(), caption.as_ptr(), style);
            }
        }
    }
}

#[cfg(not(windows))]
fn show_dialog(message: &str) {
    eprintln!("{DIALOG_TITLE}: {message}");
}
