/// Drives one invocation through the launch chain
use crate::config::types::{InvocationRequest, LauncherError, Result};
use crate::exec::preexec::{ExecReady, Launch};
use crate::kernel::credentials::{CredentialBackend, KernelCredentials};
use crate::kernel::loginuid::LoginUid;

/// Launch executor: holds where the login identity goes and which credential
/// backend performs the drop.
pub struct LaunchExecutor {
    loginuid: LoginUid,
    backend: Box<dyn CredentialBackend>,
}

impl Default for LaunchExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchExecutor {
    /// `/proc/self/loginuid` and the process's own credentials.
    pub fn new() -> Self {
        Self::with_parts(LoginUid::new(), Box::new(KernelCredentials))
    }

    pub fn with_parts(loginuid: LoginUid, backend: Box<dyn CredentialBackend>) -> Self {
        Self { loginuid, backend }
    }

    /// Resolve, bind and (if requested) drop. Nothing is executed.
    ///
    /// Any error leaves the caller obliged to exit: after a failed drop the
    /// process credentials may be half changed.
    pub fn prepare(&self, request: InvocationRequest) -> Result<Launch<ExecReady>> {
        let set_privileges = request.set_privileges;

        let launch = Launch::resolve(request)?;
        log::info!(
            "Launching for {} ({})",
            launch.request().username,
            launch.identity()
        );

        let bound = launch.bind_login_identity(&self.loginuid)?;
        if let Ok(recorded) = self.loginuid.current() {
            log::debug!("loginuid now reads {}", recorded);
        }

        if set_privileges {
            bound.drop_privileges(&*self.backend)
        } else {
            Ok(bound.keep_privileges())
        }
    }

    /// Full pipeline. Only returns if something failed.
    pub fn run(&self, request: InvocationRequest) -> LauncherError {
        let ready = match self.prepare(request) {
            Ok(ready) => ready,
            Err(e) => return e,
        };
        match ready.exec_command() {
            Ok(never) => match never {},
            Err(e) => e,
        }
    }
}
