use anyhow::Result;

use super::ServiceManager;
use crate::cmd::run_cmd;
use crate::os::InitSystem;

/// Name of the background service unit/script.
pub const SERVICE_NAME: &str = "wiredoor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl Action {
    const fn verb(self) -> &'static str {
        match self {
            Self::Start => "starting",
            Self::Stop => "stopping",
            Self::Restart => "restarting",
            Self::Enable => "enabling",
            Self::Disable => "disabling",
        }
    }
}

/// Program and arguments for `action` under `init`.
fn command_for(init: InitSystem, service: &str, action: Action) -> (&'static str, Vec<String>) {
    match init {
        InitSystem::Systemd => {
            let unit = format!("{service}.service");
            let sub = match action {
                Action::Start => "start",
                Action::Stop => "stop",
                Action::Restart => "restart",
                Action::Enable => "enable",
                Action::Disable => "disable",
            };
            ("systemctl", vec![sub.to_string(), unit])
        }
        InitSystem::OpenRc => match action {
            Action::Start => ("rc-service", vec![service.into(), "start".into()]),
            Action::Stop => ("rc-service", vec![service.into(), "stop".into()]),
            Action::Restart => ("rc-service", vec![service.into(), "restart".into()]),
            Action::Enable => (
                "rc-update",
                vec!["add".into(), service.into(), "default".into()],
            ),
            Action::Disable => ("rc-update", vec!["del".into(), service.into()]),
        },
    }
}

/// Background service controlled through systemd or OpenRC.
#[derive(Debug, Clone)]
pub struct InitServiceManager {
    init: InitSystem,
    service: String,
}

impl InitServiceManager {
    pub fn new(init: InitSystem) -> Self {
        Self {
            init,
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Manager for the init system detected from `/etc/os-release`.
    pub fn detect() -> Self {
        Self::new(InitSystem::detect())
    }

    fn run(&self, action: Action) -> Result<()> {
        let (program, args) = command_for(self.init, &self.service, action);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_cmd(
            &format!("{} {} service ({})", action.verb(), self.service, self.init),
            program,
            &args,
        )
    }
}

impl ServiceManager for InitServiceManager {
    fn start(&self) -> Result<()> {
        self.run(Action::Start)
    }

    fn stop(&self) -> Result<()> {
        self.run(Action::Stop)
    }

    fn restart(&self) -> Result<()> {
        self.run(Action::Restart)
    }

    fn enable(&self) -> Result<()> {
        self.run(Action::Enable)
    }

    fn disable(&self) -> Result<()> {
        self.run(Action::Disable)
    }
}
