use anyhow::Result;

/// Opaque top-level window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Window queries and the topmost switch the toggler needs from the OS.
pub trait WindowOps: Send + Sync {
    /// Top-level ancestor of the window under the pointer.
    fn window_under_cursor(&self) -> Option<WindowHandle>;
    fn is_topmost(&self, window: WindowHandle) -> bool;
    fn set_topmost(&self, window: WindowHandle, enable: bool) -> Result<()>;
    fn is_window(&self, window: WindowHandle) -> bool;
    fn cursor_pos(&self) -> Option<(i32, i32)>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWindows;

#[cfg(target_os = "windows")]
mod platform {
    use super::{SystemWindows, WindowHandle, WindowOps};
    use anyhow::{Context, Result};
    use windows::Win32::Foundation::{HWND, POINT};
    use windows::Win32::UI::WindowsAndMessaging::{
        GetAncestor, GetCursorPos, GetWindowLongW, IsWindow, SetWindowPos, WindowFromPoint,
        GA_ROOT, GWL_EXSTYLE, HWND_NOTOPMOST, HWND_TOPMOST, SWP_NOMOVE, SWP_NOSIZE,
        SWP_SHOWWINDOW, WS_EX_TOPMOST,
    };

    fn hwnd(window: WindowHandle) -> HWND {
        HWND(window.0 as *mut core::ffi::c_void)
    }

    impl WindowOps for SystemWindows {
        fn window_under_cursor(&self) -> Option<WindowHandle> {
            let mut pt = POINT::default();
            unsafe { GetCursorPos(&mut pt) }.ok()?;
            let child = unsafe { WindowFromPoint(pt) };
            if child.0.is_null() {
                return None;
            }
            let root = unsafe { GetAncestor(child, GA_ROOT) };
            let target = if root.0.is_null() { child } else { root };
            Some(WindowHandle(target.0 as isize))
        }

        fn is_topmost(&self, window: WindowHandle) -> bool {
            let ex = unsafe { GetWindowLongW(hwnd(window), GWL_EXSTYLE) } as u32;
            ex & WS_EX_TOPMOST.0 != 0
        }

        fn set_topmost(&self, window: WindowHandle, enable: bool) -> Result<()> {
            let insert_after = if enable { HWND_TOPMOST } else { HWND_NOTOPMOST };
            unsafe {
                SetWindowPos(
                    hwnd(window),
                    insert_after,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_SHOWWINDOW,
                )
            }
            .with_context(|| format!("SetWindowPos topmost={enable} on {window:?}"))
        }

        fn is_window(&self, window: WindowHandle) -> bool {
            unsafe { IsWindow(hwnd(window)) }.as_bool()
        }

        fn cursor_pos(&self) -> Option<(i32, i32)> {
            let mut pt = POINT::default();
            unsafe { GetCursorPos(&mut pt) }.ok()?;
            Some((pt.x, pt.y))
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl WindowOps for SystemWindows {
    fn window_under_cursor(&self) -> Option<WindowHandle> {
        None
    }

    fn is_topmost(&self, _window: WindowHandle) -> bool {
        false
    }

    fn set_topmost(&self, window: WindowHandle, _enable: bool) -> Result<()> {
        anyhow::bail!("topmost windows are only supported on Windows ({window:?})")
    }

    fn is_window(&self, _window: WindowHandle) -> bool {
        false
    }

    fn cursor_pos(&self) -> Option<(i32, i32)> {
        None
    }
}
