//! External liftOver invocation
//!
//! Runs the UCSC `liftOver` binary as a filter:
//! `liftOver -bedPlus=3 stdin <chain> stdout <unmapped>`.

use crate::core::{TransformError, TransformResult};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default executable name, resolved through `PATH`
pub const DEFAULT_LIFTOVER: &str = "liftOver";

/// A configured liftOver executable and chain file
#[derive(Debug, Clone)]
pub struct LiftOverCommand {
    program: PathBuf,
    chain: PathBuf,
}

impl LiftOverCommand {
    pub fn new<P: Into<PathBuf>>(chain: P) -> Self {
        Self {
            program: PathBuf::from(DEFAULT_LIFTOVER),
            chain: chain.into(),
        }
    }

    /// Use a specific executable instead of `liftOver` from `PATH`
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn chain(&self) -> &Path {
        &self.chain
    }

    fn build(&self, unmapped: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-bedPlus=3")
            .arg("stdin")
            .arg(&self.chain)
            .arg("stdout")
            .arg(unmapped)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Pipe `input` through liftOver into `output`
    ///
    /// Records liftOver cannot map are written to `unmapped` by the tool.
    pub fn run<R: Read + Send>(
        &self,
        mut input: R,
        output: &mut dyn Write,
        unmapped: &Path,
    ) -> TransformResult<()> {
        let program = self.program.display().to_string();
        log::debug!("Running {} on chain {:?}", program, self.chain);

        let mut child = self
            .build(unmapped)
            .spawn()
            .map_err(|source| TransformError::Spawn {
                program: program.clone(),
                source,
            })?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TransformError::Io(io::Error::other("liftOver pipes unavailable")));
        };

        // stdin is fed from its own thread so a full stdout pipe never deadlocks us
        let (fed, copied) = std::thread::scope(|s| {
            let feeder = s.spawn(move || -> io::Result<u64> {
                let n = io::copy(&mut input, &mut stdin)?;
                drop(stdin);
                Ok(n)
            });
            let copied = io::copy(&mut stdout, output);
            drop(stdout);
            if copied.is_err() {
                // Nobody drains stdout any more; the tool and the feeder would block forever.
                let _ = child.kill();
            }
            let fed = feeder
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin feeder panicked")));
            (fed, copied)
        });

        let status = child.wait()?;
        copied?;
        if !status.success() {
            return Err(TransformError::Exit {
                program,
                status: status.to_string(),
            });
        }

        // A broken pipe on stdin only matters if the tool reported success.
        fed?;
        Ok(())
    }
}
