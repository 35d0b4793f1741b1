//! Controller error type.

use cm_engine::StageError;
use cm_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("channel {0} out of range")]
    ChannelOutOfRange(usize),
    #[error("channel {0} still has a configuration waiting for the next bar")]
    CommitPending(usize),
    #[error("nothing staged for channel {0}")]
    NothingStaged(usize),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<StageError> for ControlError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::NoSuchChannel(ch) => ControlError::ChannelOutOfRange(ch),
            StageError::Pending(ch) => ControlError::CommitPending(ch),
        }
    }
}
