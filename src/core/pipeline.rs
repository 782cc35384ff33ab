//! Build phase pipeline
//!
//! The install is a fixed, strictly linear sequence of stages. The build
//! stages are `BuildPhase` values: an ordered list of typed steps plus the
//! execution context they run under. The first failing step aborts the whole
//! run; there is no retry and no resume, a failed run restarts from the top.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::error::PipelineError;
use crate::infra::process::{Step, StepRunner};

/// The fixed stage sequence of an install run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Init,
    Configure,
    ProbeBootMode,
    PartitionDisk,
    Fetch,
    PrepareEnvironment,
    BuildCrossToolchain,
    MountVirtualFs,
    BuildTempTools,
    BuildFinalSystem,
    InstallX11,
    Complete,
}

impl InstallStage {
    /// The full run in order; X11 appears only when requested
    pub fn sequence(install_x11: bool) -> Vec<Self> {
        let mut stages = vec![
            Self::Init,
            Self::Configure,
            Self::ProbeBootMode,
            Self::PartitionDisk,
            Self::Fetch,
            Self::PrepareEnvironment,
            Self::BuildCrossToolchain,
            Self::MountVirtualFs,
            Self::BuildTempTools,
            Self::BuildFinalSystem,
        ];
        if install_x11 {
            stages.push(Self::InstallX11);
        }
        stages.push(Self::Complete);
        stages
    }

    /// Heading shown to the operator when the stage starts
    pub fn title(self) -> &'static str {
        match self {
            Self::Init => "Preflight",
            Self::Configure => "Configuration",
            Self::ProbeBootMode => "Boot mode detection",
            Self::PartitionDisk => "Disk partitioning",
            Self::Fetch => "Source download",
            Self::PrepareEnvironment => "Build environment",
            Self::BuildCrossToolchain => "Cross-toolchain",
            Self::MountVirtualFs => "Virtual filesystems",
            Self::BuildTempTools => "Temporary tools",
            Self::BuildFinalSystem => "Final system",
            Self::InstallX11 => "X11 stack",
            Self::Complete => "Complete",
        }
    }
}

/// Who a phase's steps run as, and where
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecContext {
    /// Directly on the host, as root
    HostRoot,
    /// As the unprivileged build user with a minimal environment
    BuildUser,
    /// Inside the target chroot with a minimal environment
    Chroot,
}

/// One build phase: a named, ordered list of steps in one context
#[derive(Debug, Clone)]
pub struct BuildPhase {
    /// Phase name, used in logs and error messages
    pub name: String,
    /// Execution context for every step in the phase
    pub context: ExecContext,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl BuildPhase {
    /// Create an empty phase
    pub fn new(name: &str, context: ExecContext) -> Self {
        Self {
            name: name.to_string(),
            context,
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Append many steps
    pub fn extend(&mut self, steps: impl IntoIterator<Item = Step>) {
        self.steps.extend(steps);
    }
}

/// Ordered build phases plus the context wrapping needed to run them
#[derive(Debug, Clone)]
pub struct PhasePipeline {
    install_root: PathBuf,
    phases: Vec<BuildPhase>,
}

impl PhasePipeline {
    /// Create a pipeline rooted at the target mount point
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            phases: Vec::new(),
        }
    }

    /// Append a phase
    pub fn push(&mut self, phase: BuildPhase) {
        self.phases.push(phase);
    }

    /// The phases in execution order
    pub fn phases(&self) -> &[BuildPhase] {
        &self.phases
    }

    /// Total step count across all phases
    pub fn step_count(&self) -> usize {
        self.phases.iter().map(|p| p.steps.len()).sum()
    }

    /// Run every phase in order, stopping at the first failure
    ///
    /// `on_phase` fires as each phase starts, for progress display.
    pub fn run(
        &self,
        runner: &mut dyn StepRunner,
        mut on_phase: impl FnMut(&BuildPhase),
    ) -> Result<(), PipelineError> {
        for phase in &self.phases {
            on_phase(phase);
            tracing::info!(phase = %phase.name, steps = phase.steps.len(), "entering phase");

            for step in &phase.steps {
                let wrapped = wrap_step(phase.context, &self.install_root, step);
                runner.run(&phase.name, &wrapped)?;
            }
        }
        Ok(())
    }
}

/// Translate a step into its execution context
///
/// HostRoot steps run as written. BuildUser steps are wrapped in
/// `runuser -u lfs -- env -i ...` so the build user starts from a minimal,
/// known environment. Chroot steps are wrapped in `chroot <root> env -i ...`;
/// their working directory moves into `env -C` because a host-side chdir has
/// no meaning inside the chroot.
fn wrap_step(context: ExecContext, install_root: &Path, step: &Step) -> Step {
    match context {
        ExecContext::HostRoot => step.clone(),
        ExecContext::BuildUser => {
            let mut args: Vec<String> = vec![
                "-u".to_string(),
                defaults::BUILD_USER.to_string(),
                "--".to_string(),
                "env".to_string(),
                "-i".to_string(),
                format!("HOME=/home/{}", defaults::BUILD_USER),
                "TERM=xterm".to_string(),
                format!("LFS={}", install_root.display()),
                format!("LFS_TGT={}", defaults::LFS_TARGET),
                format!("PATH={}", defaults::BUILD_USER_PATH),
                step.program.clone(),
            ];
            args.extend(step.args.iter().cloned());

            Step {
                program: "runuser".to_string(),
                args,
                cwd: step.cwd.clone(),
                stdin: step.stdin.clone(),
            }
        }
        ExecContext::Chroot => {
            let mut args: Vec<String> = vec![
                install_root.display().to_string(),
                "/usr/bin/env".to_string(),
                "-i".to_string(),
            ];
            if let Some(cwd) = &step.cwd {
                args.push("-C".to_string());
                args.push(cwd.display().to_string());
            }
            args.extend([
                "HOME=/root".to_string(),
                "TERM=xterm".to_string(),
                format!("PATH={}", defaults::CHROOT_PATH),
                step.program.clone(),
            ]);
            args.extend(step.args.iter().cloned());

            Step {
                program: "chroot".to_string(),
                args,
                cwd: None,
                stdin: step.stdin.clone(),
            }
        }
    }
}
