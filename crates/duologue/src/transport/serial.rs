use std::fs::{File, OpenOptions};
use std::io::Write as _;

use tokio::task::spawn_blocking;

use super::{Transport, TransportError};

/// The rate the microcontroller displays listen at.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Writes to serial devices by their path, e.g. `/dev/ttyUSB0`.
///
/// The port is opened for every write, switched to raw mode at the
/// configured baud rate, written and closed again. A path that is not a
/// terminal is written without configuration.
#[derive(Clone, Copy, Debug)]
pub struct SerialTransport {
    baud_rate: u32,
}

impl SerialTransport {
    /// Creates a transport that talks at `baud_rate`.
    #[inline]
    pub fn new(baud_rate: u32) -> Self {
        Self { baud_rate }
    }
}

impl Default for SerialTransport {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl Transport for SerialTransport {
    fn write(
        &self,
        port: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send + 'static {
        let port = port.to_owned();
        let baud_rate = self.baud_rate;
        async move {
            let task_port = port.clone();
            match spawn_blocking(move || write_blocking(&task_port, baud_rate, &bytes))
                .await
            {
                Ok(result) => result,
                Err(err) => Err(TransportError::Write {
                    port,
                    source: std::io::Error::other(err),
                }),
            }
        }
    }
}

fn write_blocking(
    port: &str,
    baud_rate: u32,
    bytes: &[u8],
) -> Result<(), TransportError> {
    let mut file = open(port).map_err(|source| TransportError::Open {
        port: port.to_owned(),
        source,
    })?;
    configure(&file, baud_rate)
        .and_then(|_| set_blocking(&file))
        .map_err(|reason| TransportError::Configure {
            port: port.to_owned(),
            reason,
        })?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|source| TransportError::Write {
            port: port.to_owned(),
            source,
        })?;
    trace!("wrote {} bytes to {port} at {baud_rate} bps", bytes.len());
    Ok(())
}

#[cfg(unix)]
fn open(port: &str) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    use nix::fcntl::OFlag;

    // Opening a terminal must not make it our controlling terminal, nor
    // wait for carrier on a line without CLOCAL.
    OpenOptions::new()
        .append(true)
        .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
        .open(port)
}

#[cfg(not(unix))]
fn open(port: &str) -> std::io::Result<File> {
    OpenOptions::new().append(true).open(port)
}

#[cfg(unix)]
fn configure(file: &File, baud_rate: u32) -> Result<(), String> {
    use nix::errno::Errno;
    use nix::sys::termios::{self, ControlFlags, SetArg};

    let mut attrs = match termios::tcgetattr(file) {
        Ok(attrs) => attrs,
        Err(Errno::ENOTTY) => {
            debug!("not a terminal, writing without configuration");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    let speed = baud_rate_of(baud_rate)
        .ok_or_else(|| format!("unsupported baud rate {baud_rate}"))?;
    termios::cfmakeraw(&mut attrs);
    attrs
        .control_flags
        .insert(ControlFlags::CLOCAL | ControlFlags::CREAD);
    termios::cfsetspeed(&mut attrs, speed).map_err(|err| err.to_string())?;
    termios::tcsetattr(file, SetArg::TCSANOW, &attrs)
        .map_err(|err| err.to_string())
}

#[cfg(not(unix))]
fn configure(_file: &File, _baud_rate: u32) -> Result<(), String> {
    Ok(())
}

/// Writes block again once the line ignores modem control.
#[cfg(unix)]
fn set_blocking(file: &File) -> Result<(), String> {
    use std::os::fd::AsRawFd;

    use nix::fcntl::{FcntlArg, OFlag, fcntl};

    let fd = file.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|err| err.to_string())?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.remove(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|err| err.to_string())?;
    Ok(())
}

#[cfg(not(unix))]
fn set_blocking(_file: &File) -> Result<(), String> {
    Ok(())
}

#[cfg(unix)]
fn baud_rate_of(rate: u32) -> Option<nix::sys::termios::BaudRate> {
    use nix::sys::termios::BaudRate;

    Some(match rate {
        1200 => BaudRate::B1200,
        2400 => BaudRate::B2400,
        4800 => BaudRate::B4800,
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115200 => BaudRate::B115200,
        230400 => BaudRate::B230400,
        _ => return None,
    })
}
