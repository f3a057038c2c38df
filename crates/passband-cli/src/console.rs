//! Line-oriented control console for a running engine.

use std::fmt;

use passband_io::DeviceId;

/// One console command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    /// Change the center frequency.
    Center(f32),
    /// Change the bandwidth.
    Bandwidth(f32),
    /// Change center and bandwidth together.
    Set { center: f32, bandwidth: f32 },
    /// Start audio flow.
    Start,
    /// Pause audio flow.
    Stop,
    /// Print the engine status as JSON.
    Status,
    /// List devices.
    Devices,
    /// Switch devices; `None` keeps the current buffer size.
    Select {
        input: DeviceId,
        output: DeviceId,
        buffer_size: Option<u32>,
    },
    /// Print the command list.
    Help,
    /// Close the engine and exit.
    Quit,
}

/// A console line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{value}' is not a valid {what}")]
    BadNumber { what: &'static str, value: String },
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "center" | "c" => match args.as_slice() {
                [hz] => Self::Center(hertz(hz)?),
                _ => return Err(ParseError::Usage("center <hz>")),
            },
            "bandwidth" | "bw" => match args.as_slice() {
                [hz] => Self::Bandwidth(hertz(hz)?),
                _ => return Err(ParseError::Usage("bandwidth <hz>")),
            },
            "set" => match args.as_slice() {
                [center, bandwidth] => Self::Set {
                    center: hertz(center)?,
                    bandwidth: hertz(bandwidth)?,
                },
                _ => return Err(ParseError::Usage("set <center hz> <bandwidth hz>")),
            },
            "select" => match args.as_slice() {
                [input, output] => Self::Select {
                    input: device_id(input)?,
                    output: device_id(output)?,
                    buffer_size: None,
                },
                [input, output, buffer] => Self::Select {
                    input: device_id(input)?,
                    output: device_id(output)?,
                    buffer_size: Some(frames(buffer)?),
                },
                _ => return Err(ParseError::Usage("select <input id> <output id> [buffer frames]")),
            },
            "start" => no_args(args.as_slice(), Self::Start, "start")?,
            "stop" => no_args(args.as_slice(), Self::Stop, "stop")?,
            "status" => no_args(args.as_slice(), Self::Status, "status")?,
            "devices" => no_args(args.as_slice(), Self::Devices, "devices")?,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn no_args(
    args: &[&str],
    command: ConsoleCommand,
    usage: &'static str,
) -> Result<ConsoleCommand, ParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::Usage(usage))
    }
}

fn hertz(value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::BadNumber {
        what: "frequency",
        value: value.to_string(),
    })
}

fn device_id(value: &str) -> Result<DeviceId, ParseError> {
    value.parse().map_err(|_| ParseError::BadNumber {
        what: "device id",
        value: value.to_string(),
    })
}

fn frames(value: &str) -> Result<u32, ParseError> {
    value.parse().map_err(|_| ParseError::BadNumber {
        what: "buffer size",
        value: value.to_string(),
    })
}

/// Help text shown by `help`.
pub struct Usage;

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commands:")?;
        writeln!(f, "  center <hz>                  set center frequency")?;
        writeln!(f, "  bandwidth <hz>               set bandwidth")?;
        writeln!(f, "  set <center> <bandwidth>     set both")?;
        writeln!(f, "  start | stop                 start or pause audio")?;
        writeln!(f, "  status                       print engine status (JSON)")?;
        writeln!(f, "  devices                      list devices")?;
        writeln!(f, "  select <in> <out> [buffer]   switch devices")?;
        write!(f, "  quit                         close and exit")
    }
}
