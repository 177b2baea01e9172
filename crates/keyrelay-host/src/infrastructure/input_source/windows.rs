//! Windows Raw Input keyboard capture.
//!
//! Creates a hidden message-only window on a dedicated thread and registers
//! it for keyboard Raw Input (HID usage page 0x01, usage 0x06) with
//! `RIDEV_INPUTSINK`, so key edges keep arriving while other applications
//! have focus.  Each `WM_INPUT` carries the handle of the physical keyboard
//! that produced it; that handle becomes the [`DeviceId`].
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::ffi::c_void;
use std::mem::size_of;
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread;

use keyrelay_core::{DeviceId, KeyTransition};
use tracing::{debug, info, warn};
use windows::core::w;
use windows::Win32::Foundation::{GetLastError, HANDLE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::{
    GetRawInputData, GetRawInputDeviceInfoW, RegisterRawInputDevices, HRAWINPUT, RAWINPUT,
    RAWINPUTDEVICE, RAWINPUTHEADER, RIDEV_INPUTSINK, RIDI_DEVICENAME, RID_INPUT,
    RIM_TYPEKEYBOARD,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostThreadMessageW, RegisterClassW, TranslateMessage, HWND_MESSAGE, MSG, WINDOW_EX_STYLE,
    WINDOW_STYLE, WM_INPUT, WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN, WNDCLASSW,
};

use super::{CaptureError, InputSource, KeyTransitionStream};
use crate::application::device_registry::{DeviceNameLookup, NameLookupError};

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_KEYBOARD: u16 = 0x06;

thread_local! {
    /// Producer half of the stream, owned by the message loop thread.
    /// Dropped when the loop exits, which ends the consumer's stream.
    static SINK: RefCell<Option<Sender<KeyTransition>>> = const { RefCell::new(None) };
}

/// Windows Raw Input capture service.
pub struct WindowsRawInputSource {
    /// Thread id of the message loop, set once `start()` succeeds.
    loop_thread: Mutex<Option<u32>>,
}

impl WindowsRawInputSource {
    /// Creates a new (unstarted) source.
    pub fn new() -> Self {
        Self {
            loop_thread: Mutex::new(None),
        }
    }
}

impl Default for WindowsRawInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for WindowsRawInputSource {
    fn start(&self) -> Result<KeyTransitionStream, CaptureError> {
        let mut loop_thread = self
            .loop_thread
            .lock()
            .map_err(|_| CaptureError::RegistrationFailed("state lock poisoned".to_string()))?;
        if loop_thread.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }

        let (event_tx, event_rx) = mpsc::channel::<KeyTransition>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, CaptureError>>();

        thread::Builder::new()
            .name("keyrelay-raw-input".to_string())
            .spawn(move || run_raw_input_loop(event_tx, ready_tx))
            .map_err(|e| CaptureError::RegistrationFailed(e.to_string()))?;

        // Registration happens on the loop thread; wait for its verdict.
        let thread_id = ready_rx.recv().map_err(|_| {
            CaptureError::RegistrationFailed("raw input thread exited during setup".to_string())
        })??;
        *loop_thread = Some(thread_id);

        info!("registered for raw keyboard input");
        Ok(KeyTransitionStream::new(event_rx))
    }

    fn stop(&self) {
        let thread_id = match self.loop_thread.lock() {
            Ok(guard) => *guard,
            Err(_) => None,
        };
        if let Some(id) = thread_id {
            // SAFETY: posting WM_QUIT to a thread id is valid even if that
            // thread has already exited; the call then simply fails.
            if let Err(e) = unsafe { PostThreadMessageW(id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                debug!("raw input loop already gone: {e}");
            }
        }
    }
}

impl DeviceNameLookup for WindowsRawInputSource {
    fn device_name(&self, device: DeviceId) -> Result<String, NameLookupError> {
        let handle = HANDLE(device.raw() as usize as *mut c_void);
        let mut len: u32 = 0;

        // SAFETY: a null data pointer asks only for the required length
        // (in characters) of the device interface path.
        let rc = unsafe { GetRawInputDeviceInfoW(Some(handle), RIDI_DEVICENAME, None, &mut len) };
        if rc == u32::MAX {
            return Err(NameLookupError::UnknownDevice(device));
        }

        let mut buf = vec![0u16; len as usize];
        // SAFETY: `buf` holds `len` UTF-16 units, as reported by the call above.
        let rc = unsafe {
            GetRawInputDeviceInfoW(
                Some(handle),
                RIDI_DEVICENAME,
                Some(buf.as_mut_ptr() as *mut c_void),
                &mut len,
            )
        };
        if rc == u32::MAX {
            return Err(NameLookupError::Platform(format!(
                "GetRawInputDeviceInfoW failed for device {device}"
            )));
        }

        let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        Ok(String::from_utf16_lossy(&buf[..end]))
    }
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_raw_input_loop(events: Sender<KeyTransition>, ready: Sender<Result<u32, CaptureError>>) {
    let hwnd = match create_sink_window().and_then(|hwnd| register_keyboards(hwnd).map(|_| hwnd)) {
        Ok(hwnd) => hwnd,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    SINK.with(|sink| *sink.borrow_mut() = Some(events));
    // SAFETY: no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    if ready.send(Ok(thread_id)).is_err() {
        warn!("capture owner vanished before raw input loop started");
    }

    // Win32 message loop – blocks until WM_QUIT is posted
    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern on the
    // thread that owns `hwnd`.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        let _ = DestroyWindow(hwnd);
    }

    SINK.with(|sink| sink.borrow_mut().take());
    debug!("raw input loop exited");
}

fn create_sink_window() -> Result<HWND, CaptureError> {
    let class_name = w!("KeyRelayRawInputSink");

    // SAFETY: GetModuleHandleW(None) returns the handle of the current
    // executable; the class and window are used only on this thread.
    unsafe {
        let instance = GetModuleHandleW(None)
            .map_err(|e| CaptureError::RegistrationFailed(e.to_string()))?;

        let class = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance.into(),
            lpszClassName: class_name,
            ..Default::default()
        };
        if RegisterClassW(&class) == 0 {
            return Err(CaptureError::RegistrationFailed(format!(
                "RegisterClassW failed with error {}",
                GetLastError().0
            )));
        }

        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            w!("KeyRelay"),
            WINDOW_STYLE::default(),
            0,
            0,
            0,
            0,
            Some(HWND_MESSAGE),
            None,
            Some(instance.into()),
            None,
        )
        .map_err(|e| CaptureError::RegistrationFailed(format!("CreateWindowExW failed: {e}")))
    }
}

fn register_keyboards(hwnd: HWND) -> Result<(), CaptureError> {
    let device = RAWINPUTDEVICE {
        usUsagePage: HID_USAGE_PAGE_GENERIC,
        usUsage: HID_USAGE_GENERIC_KEYBOARD,
        dwFlags: RIDEV_INPUTSINK,
        hwndTarget: hwnd,
    };

    // SAFETY: `device` is a fully initialized RAWINPUTDEVICE and the size
    // argument matches its layout.
    unsafe { RegisterRawInputDevices(&[device], size_of::<RAWINPUTDEVICE>() as u32) }
        .map_err(|e| CaptureError::RegistrationFailed(format!("RegisterRawInputDevices failed: {e}")))
}

/// Window procedure for the message-only sink window.
///
/// # Safety
///
/// Called by Windows from the message loop thread only.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if msg == WM_INPUT {
        if let Some(transition) = read_raw_keyboard(HRAWINPUT(l_param.0 as *mut c_void)) {
            SINK.with(|sink| {
                if let Some(tx) = sink.borrow().as_ref() {
                    let _ = tx.send(transition);
                }
            });
        }
    }
    // SAFETY: default processing also releases the raw input buffer.
    unsafe { DefWindowProcW(hwnd, msg, w_param, l_param) }
}

/// Copies the raw input record behind `handle` and decodes keyboard edges.
fn read_raw_keyboard(handle: HRAWINPUT) -> Option<KeyTransition> {
    // SAFETY: RAWINPUT is plain data; all-zero is a valid bit pattern.
    let mut raw: RAWINPUT = unsafe { std::mem::zeroed() };
    let mut size = size_of::<RAWINPUT>() as u32;

    // SAFETY: `raw` is large enough for any keyboard record and `size`
    // tells the API how much it may write.
    let copied = unsafe {
        GetRawInputData(
            handle,
            RID_INPUT,
            Some(&mut raw as *mut RAWINPUT as *mut c_void),
            &mut size,
            size_of::<RAWINPUTHEADER>() as u32,
        )
    };
    if copied == 0 || copied == u32::MAX {
        return None;
    }
    decode_keyboard(&raw)
}

fn decode_keyboard(raw: &RAWINPUT) -> Option<KeyTransition> {
    if raw.header.dwType != RIM_TYPEKEYBOARD.0 {
        return None;
    }
    // SAFETY: dwType says the union holds a RAWKEYBOARD.
    let keyboard = unsafe { raw.data.keyboard };
    let pressed = keyboard.Message == WM_KEYDOWN || keyboard.Message == WM_SYSKEYDOWN;

    Some(KeyTransition {
        device: DeviceId::from_raw(raw.header.hDevice.0 as usize as u64),
        code: keyboard.VKey,
        pressed,
    })
}
