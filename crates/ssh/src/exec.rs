//! Remote command output collection.

use russh::ChannelMsg;

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, if the server reported one.
    pub exit_code: Option<u32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// True when the command reported exit status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Folds channel messages into a [`CommandOutput`].
///
/// The exit status may arrive after EOF, so collection continues until the
/// channel closes.
#[derive(Debug, Default)]
pub(crate) struct OutputCollector {
    output: CommandOutput,
}

impl OutputCollector {
    /// Feeds one message. Returns `false` once the channel is closed.
    pub(crate) fn push(&mut self, msg: Option<ChannelMsg>) -> bool {
        match msg {
            Some(ChannelMsg::Data { data }) => {
                self.output.stdout.extend_from_slice(&data);
            }
            Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                self.output.stderr.extend_from_slice(&data);
            }
            Some(ChannelMsg::ExitStatus { exit_status }) => {
                self.output.exit_code = Some(exit_status);
            }
            Some(ChannelMsg::Close) | None => return false,
            Some(_) => {}
        }
        true
    }

    pub(crate) fn finish(self) -> CommandOutput {
        self.output
    }
}
