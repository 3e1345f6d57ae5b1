use std::ffi::c_void;
use std::mem::{size_of, zeroed};
use std::ptr::{null, null_mut};
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{bail, Result};
use log::debug;
use trampoline_core::text::skip_program_name;
use trampoline_core::ResolvedCommand;
use windows_sys::Win32::Foundation::{
    CloseHandle, DuplicateHandle, GetLastError, BOOL, DUPLICATE_SAME_ACCESS, ERROR_INVALID_HANDLE, HANDLE, TRUE,
};
use windows_sys::Win32::System::Console::{
    GenerateConsoleCtrlEvent, GetStdHandle, SetConsoleCtrlHandler, CTRL_C_EVENT, STD_ERROR_HANDLE, STD_HANDLE,
    STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};
use windows_sys::Win32::System::Environment::GetCommandLineW;
use windows_sys::Win32::System::JobObjects::{
    AssignProcessToJobObject, CreateJobObjectW, JobObjectExtendedLimitInformation, QueryInformationJobObject,
    SetInformationJobObject, JOBOBJECT_EXTENDED_LIMIT_INFORMATION, JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE,
    JOB_OBJECT_LIMIT_SILENT_BREAKAWAY_OK,
};
use windows_sys::Win32::System::Threading::{
    CreateProcessW, GetCurrentProcess, GetExitCodeProcess, WaitForSingleObject, INFINITE, PROCESS_INFORMATION,
    STARTF_USESTDHANDLES, STARTUPINFOW,
};

/// Child process id for the console control handler; zero until the child exists.
static CHILD_PID: AtomicU32 = AtomicU32::new(0);

/// The raw command line of this process with the program name removed.
pub fn forwarded_command_line() -> String {
    let cmdline = unsafe {
        let ptr = GetCommandLineW();
        let mut len = 0;
        while *ptr.add(len) != 0 {
            len += 1;
        }
        String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
    };
    skip_program_name(&cmdline).to_string()
}

/// Kills everything still in it when the handle is closed.
struct Job(HANDLE);

impl Job {
    fn new() -> Result<Self> {
        unsafe {
            let job = CreateJobObjectW(null(), null());
            if job.is_null() {
                bail!("Job creation failed (error {})", GetLastError());
            }
            let job = Job(job);

            let mut info: JOBOBJECT_EXTENDED_LIMIT_INFORMATION = zeroed();
            let size = size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>() as u32;
            let mut returned = 0u32;
            let ok = QueryInformationJobObject(
                job.0,
                JobObjectExtendedLimitInformation,
                &mut info as *mut _ as *mut c_void,
                size,
                &mut returned,
            );
            if ok == 0 || returned != size {
                bail!("Job information querying failed");
            }

            info.BasicLimitInformation.LimitFlags |=
                JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE | JOB_OBJECT_LIMIT_SILENT_BREAKAWAY_OK;
            let ok = SetInformationJobObject(
                job.0,
                JobObjectExtendedLimitInformation,
                &info as *const _ as *const c_void,
                size,
            );
            if ok == 0 {
                bail!("Job information setting failed");
            }
            Ok(job)
        }
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// Inheritable copy of a standard handle; null if the handle does not exist.
fn duplicate_std_handle(which: STD_HANDLE, name: &str) -> Result<HANDLE> {
    unsafe {
        let process = GetCurrentProcess();
        let mut out: HANDLE = null_mut();
        let ok = DuplicateHandle(process, GetStdHandle(which), process, &mut out, 0, TRUE, DUPLICATE_SAME_ACCESS);
        if ok == 0 {
            let rc = GetLastError();
            if rc != ERROR_INVALID_HANDLE {
                bail!("{} duplication failed (error {})", name, rc);
            }
            out = null_mut();
        }
        Ok(out)
    }
}

unsafe extern "system" fn control_key_handler(ctrl_type: u32) -> BOOL {
    let pid = CHILD_PID.load(Ordering::SeqCst);
    if ctrl_type == CTRL_C_EVENT && pid != 0 {
        GenerateConsoleCtrlEvent(CTRL_C_EVENT, pid);
    }
    TRUE
}

/// Start the child, wait for it and return its exit code.
pub fn run(command: &ResolvedCommand) -> Result<i32> {
    let cmdline = command.command_line()?;
    let mut wide: Vec<u16> = cmdline.encode_utf16().chain(Some(0)).collect();

    let job = Job::new()?;

    let mut si: STARTUPINFOW = unsafe { zeroed() };
    si.cb = size_of::<STARTUPINFOW>() as u32;
    si.hStdInput = duplicate_std_handle(STD_INPUT_HANDLE, "stdin")?;
    si.hStdOutput = duplicate_std_handle(STD_OUTPUT_HANDLE, "stdout")?;
    si.hStdError = duplicate_std_handle(STD_ERROR_HANDLE, "stderr")?;
    si.dwFlags = STARTF_USESTDHANDLES;

    unsafe {
        SetConsoleCtrlHandler(Some(control_key_handler), TRUE);

        let mut pi: PROCESS_INFORMATION = zeroed();
        let ok = CreateProcessW(
            null(),
            wide.as_mut_ptr(),
            null(),
            null(),
            TRUE,
            0,
            null(),
            null(),
            &si,
            &mut pi,
        );
        if ok == 0 {
            bail!("Unable to create process using '{}' (error {})", cmdline, GetLastError());
        }
        debug!("started child process {}", pi.dwProcessId);
        CHILD_PID.store(pi.dwProcessId, Ordering::SeqCst);

        AssignProcessToJobObject(job.0, pi.hProcess);
        CloseHandle(pi.hThread);
        WaitForSingleObject(pi.hProcess, INFINITE);

        let mut code = 0u32;
        if GetExitCodeProcess(pi.hProcess, &mut code) == 0 {
            bail!("Failed to get exit code of process");
        }
        // The job has to outlive the wait; closing it kills whatever the child left behind.
        drop(job);
        Ok(code as i32)
    }
}
