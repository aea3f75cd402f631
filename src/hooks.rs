use crate::input::InputEvent;
use anyhow::Result;
use std::sync::mpsc::Sender;

/// Global low-level keyboard and mouse hooks, each pumped by its own thread.
#[derive(Debug, Default)]
pub struct InputHooks {
    installed: bool,
    #[cfg(windows)]
    backend: platform::HookThreads,
}

impl InputHooks {
    pub fn install(&mut self, sender: Sender<InputEvent>) -> Result<()> {
        if self.installed {
            return Ok(());
        }

        #[cfg(windows)]
        self.backend.install(sender)?;
        #[cfg(not(windows))]
        {
            drop(sender);
            tracing::warn!("global input hooks are only available on Windows");
        }

        self.installed = true;
        tracing::info!("input hooks installed");
        Ok(())
    }

    pub fn uninstall(&mut self) {
        if !self.installed {
            return;
        }

        #[cfg(windows)]
        self.backend.uninstall();

        self.installed = false;
        tracing::info!("input hooks removed");
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl Drop for InputHooks {
    fn drop(&mut self) {
        self.uninstall();
    }
}

#[cfg(windows)]
mod platform {
    use crate::input::{InputEvent, RawButton, RawKey};
    use anyhow::{anyhow, Result};
    use once_cell::sync::Lazy;
    use std::sync::mpsc::{sync_channel, Sender};
    use std::sync::Mutex;
    use std::thread::JoinHandle;
    use std::time::Duration;
    use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS, MSLLHOOKSTRUCT,
        WINDOWS_HOOK_ID, WH_KEYBOARD_LL, WH_MOUSE_LL,
    };

    static EVENT_SENDER: Lazy<Mutex<Option<Sender<InputEvent>>>> = Lazy::new(|| Mutex::new(None));

    const HOOK_READY_TIMEOUT: Duration = Duration::from_secs(2);
    const XBUTTON1: u32 = 0x0001;
    const XBUTTON2: u32 = 0x0002;

    #[derive(Debug, Clone, Copy)]
    enum HookKind {
        Keyboard,
        Mouse,
    }

    impl HookKind {
        fn id(self) -> WINDOWS_HOOK_ID {
            match self {
                HookKind::Keyboard => WH_KEYBOARD_LL,
                HookKind::Mouse => WH_MOUSE_LL,
            }
        }

        fn name(self) -> &'static str {
            match self {
                HookKind::Keyboard => "ontop-keyboard-hook",
                HookKind::Mouse => "ontop-mouse-hook",
            }
        }
    }

    #[derive(Debug)]
    struct HookThread {
        thread_id: u32,
        join: JoinHandle<()>,
    }

    #[derive(Debug, Default)]
    pub struct HookThreads {
        threads: Vec<HookThread>,
    }

    impl HookThreads {
        pub fn install(&mut self, sender: Sender<InputEvent>) -> Result<()> {
            if !self.threads.is_empty() {
                return Ok(());
            }

            if let Ok(mut guard) = EVENT_SENDER.lock() {
                *guard = Some(sender);
            }

            for kind in [HookKind::Keyboard, HookKind::Mouse] {
                match spawn_hook_thread(kind) {
                    Ok(thread) => self.threads.push(thread),
                    Err(err) => {
                        self.uninstall();
                        return Err(err);
                    }
                }
            }
            Ok(())
        }

        pub fn uninstall(&mut self) {
            if let Ok(mut guard) = EVENT_SENDER.lock() {
                *guard = None;
            }

            use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};
            for th in self.threads.drain(..) {
                unsafe {
                    let _ = PostThreadMessageW(th.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
                }
                if th.join.join().is_err() {
                    tracing::warn!("hook thread panicked");
                }
            }
        }
    }

    fn spawn_hook_thread(kind: HookKind) -> Result<HookThread> {
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows::Win32::System::Threading::GetCurrentThreadId;
        use windows::Win32::UI::WindowsAndMessaging::{
            DispatchMessageW, GetMessageW, PeekMessageW, SetWindowsHookExW, TranslateMessage,
            UnhookWindowsHookEx, MSG, PM_NOREMOVE,
        };

        let (ready_tx, ready_rx) = sync_channel::<Result<u32>>(1);

        let join = std::thread::Builder::new()
            .name(kind.name().into())
            .spawn(move || {
                // Force creation of the thread message queue before reporting the id.
                let mut msg = MSG::default();
                unsafe {
                    let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
                }

                let thread_id = unsafe { GetCurrentThreadId() };
                let hmodule = match unsafe { GetModuleHandleW(None) } {
                    Ok(h) => h,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow!(err)));
                        return;
                    }
                };

                let proc_fn: unsafe extern "system" fn(i32, WPARAM, LPARAM) -> LRESULT =
                    match kind {
                        HookKind::Keyboard => keyboard_hook_proc,
                        HookKind::Mouse => mouse_hook_proc,
                    };
                let hook = match unsafe { SetWindowsHookExW(kind.id(), Some(proc_fn), hmodule, 0) } {
                    Ok(h) if !h.0.is_null() => h,
                    Ok(_) => {
                        let _ = ready_tx.send(Err(anyhow!(windows::core::Error::from_win32())));
                        return;
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow!(err)));
                        return;
                    }
                };

                let _ = ready_tx.send(Ok(thread_id));

                loop {
                    let r = unsafe { GetMessageW(&mut msg, None, 0, 0) };
                    if r.0 <= 0 {
                        break;
                    }
                    unsafe {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }

                unsafe {
                    let _ = UnhookWindowsHookEx(hook);
                }
            })?;

        let thread_id = ready_rx
            .recv_timeout(HOOK_READY_TIMEOUT)
            .map_err(|_| anyhow!("{} thread did not signal readiness", kind.name()))??;
        Ok(HookThread { thread_id, join })
    }

    fn forward(event: InputEvent) {
        if let Ok(guard) = EVENT_SENDER.lock() {
            if let Some(sender) = guard.as_ref() {
                let _ = sender.send(event);
            }
        }
    }

    fn layout_char(vk_code: u32) -> Option<char> {
        use windows::Win32::UI::Input::KeyboardAndMouse::{MapVirtualKeyW, MAPVK_VK_TO_CHAR};

        let mapped = unsafe { MapVirtualKeyW(vk_code, MAPVK_VK_TO_CHAR) };
        // High bit marks dead keys; the low word holds the character.
        let code = mapped & 0xFFFF;
        if code == 0 {
            return None;
        }
        char::from_u32(code)
    }

    fn next_hook(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
        unsafe { CallNextHookEx(HHOOK(std::ptr::null_mut()), n_code, w_param, l_param) }
    }

    unsafe extern "system" fn keyboard_hook_proc(
        n_code: i32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        use windows::Win32::UI::WindowsAndMessaging::{
            WM_KEYDOWN, WM_KEYUP, WM_SYSKEYDOWN, WM_SYSKEYUP,
        };

        if n_code == HC_ACTION as i32 {
            let pressed = match w_param.0 as u32 {
                WM_KEYDOWN | WM_SYSKEYDOWN => Some(true),
                WM_KEYUP | WM_SYSKEYUP => Some(false),
                _ => None,
            };
            if let Some(pressed) = pressed {
                let info = unsafe { &*(l_param.0 as *const KBDLLHOOKSTRUCT) };
                let injected =
                    (info.flags & KBDLLHOOKSTRUCT_FLAGS(0x10)) != KBDLLHOOKSTRUCT_FLAGS(0);
                if !injected {
                    let key = RawKey::new(info.vkCode, layout_char(info.vkCode));
                    forward(InputEvent::Key { key, pressed });
                }
            }
        }

        next_hook(n_code, w_param, l_param)
    }

    unsafe extern "system" fn mouse_hook_proc(
        n_code: i32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        use windows::Win32::UI::WindowsAndMessaging::{
            WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_RBUTTONDOWN,
            WM_RBUTTONUP, WM_XBUTTONDOWN, WM_XBUTTONUP,
        };

        if n_code == HC_ACTION as i32 {
            let info = unsafe { &*(l_param.0 as *const MSLLHOOKSTRUCT) };
            // 0x1 = LLMHF_INJECTED, 0x2 = LLMHF_LOWER_IL_INJECTED
            let injected = (info.flags & 0x3) != 0;
            let xbutton = match info.mouseData >> 16 {
                XBUTTON1 => Some(RawButton::X1),
                XBUTTON2 => Some(RawButton::X2),
                _ => None,
            };
            let event = match w_param.0 as u32 {
                WM_LBUTTONDOWN => Some((Some(RawButton::Left), true)),
                WM_LBUTTONUP => Some((Some(RawButton::Left), false)),
                WM_RBUTTONDOWN => Some((Some(RawButton::Right), true)),
                WM_RBUTTONUP => Some((Some(RawButton::Right), false)),
                WM_MBUTTONDOWN => Some((Some(RawButton::Middle), true)),
                WM_MBUTTONUP => Some((Some(RawButton::Middle), false)),
                WM_XBUTTONDOWN => Some((xbutton, true)),
                WM_XBUTTONUP => Some((xbutton, false)),
                _ => None,
            };
            if let (false, Some((Some(button), pressed))) = (injected, event) {
                forward(InputEvent::Mouse { button, pressed });
            }
        }

        next_hook(n_code, w_param, l_param)
    }
}
