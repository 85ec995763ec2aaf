//! Command grammar.
//!
//! A line holds one or more segments joined by `+` (CR and LF also split).
//! Each segment is capped at [`SEGMENT_MAX`] bytes, tokenized on whitespace
//! and commas, and matched case-insensitively. Global commands are checked
//! before the per-axis `M<id> ...` form.

use std::fmt;

use crate::state::axis::AxisId;

/// Longest segment kept; the rest is dropped.
pub const SEGMENT_MAX: usize = 63;

/// One bounded command segment.
pub type Segment = heapless::String<SEGMENT_MAX>;

/// Why a `MoveTo` could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveToError {
    MissingTarget,
    BadTarget,
}

impl fmt::Display for MoveToError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget => f.write_str("MoveToMissingTarget"),
            Self::BadTarget => f.write_str("MoveToBadTarget"),
        }
    }
}

/// Tuning fields named in a `key=value` command; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TuningUpdate {
    pub velocity: Option<u16>,
    pub accel: Option<u16>,
    pub decel: Option<u16>,
    pub peak_current: Option<u16>,
    pub microstep: Option<u16>,
}

impl TuningUpdate {
    /// Record one `key=value` token. Unknown keys and bad values are skipped.
    fn absorb(&mut self, token: &str) {
        let Some((key, value)) = token.split_once('=') else {
            return;
        };
        let Ok(value) = value.parse::<u16>() else {
            return;
        };
        let slot = match key {
            "vel" => &mut self.velocity,
            "accel" => &mut self.accel,
            "decel" => &mut self.decel,
            "peak" => &mut self.peak_current,
            "micro" => &mut self.microstep,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// Per-axis verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisVerb {
    /// `st t` / `st f`
    Poll(bool),
    /// `read`
    Read,
    /// `set lo`
    SetLower,
    /// `set hi`
    SetUpper,
    /// `send cfg`
    SendConfig,
    /// `MoveTo<n>` / `MoveTo <n>`
    MoveTo(Result<i32, MoveToError>),
    /// `key=value ...`
    Tune(TuningUpdate),
    /// `s`
    Stop,
    /// `<signed int>`
    Relative(i32),
}

/// Parsed command segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StopAll,
    /// `None` queries.
    Admin(Option<bool>),
    Engineering(Option<bool>),
    ReadAll,
    ReadErrors,
    Laser(Option<bool>),
    /// `FG` (true) / `FS` (false).
    Fan(bool),
    Axis { id: AxisId, verb: AxisVerb },
    /// Anything outside the grammar, including out-of-range axis ids.
    Ignored,
}

/// Split a raw line into bounded segments, skipping empty ones.
pub fn split_line(line: &str) -> Vec<Segment> {
    line.split(['+', '\r', '\n'])
        .filter(|s| !s.is_empty())
        .map(bounded)
        .collect()
}

fn bounded(raw: &str) -> Segment {
    let mut segment = Segment::new();
    for c in raw.chars() {
        if segment.push(c).is_err() {
            break;
        }
    }
    segment
}

fn toggle(arg: Option<&str>) -> Option<Option<bool>> {
    match arg {
        None => Some(None),
        Some("on") => Some(Some(true)),
        Some("off") => Some(Some(false)),
        Some(_) => None,
    }
}

/// Parse one segment.
pub fn parse_segment(segment: &str) -> Command {
    let lowered = segment.to_ascii_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => Command::Ignored,
        ["stop", "all"] => Command::StopAll,
        ["fg"] => Command::Fan(true),
        ["fs"] => Command::Fan(false),
        ["read", "all"] => Command::ReadAll,
        ["read", "errors"] => Command::ReadErrors,
        ["admin", rest @ ..] if rest.len() <= 1 => toggle(rest.first().copied())
            .map(Command::Admin)
            .unwrap_or(Command::Ignored),
        ["eng", rest @ ..] if rest.len() <= 1 => toggle(rest.first().copied())
            .map(Command::Engineering)
            .unwrap_or(Command::Ignored),
        ["laser", rest @ ..] if rest.len() <= 1 => toggle(rest.first().copied())
            .map(Command::Laser)
            .unwrap_or(Command::Ignored),
        [head, rest @ ..] => parse_axis(head, rest),
    }
}

fn parse_axis(head: &str, rest: &[&str]) -> Command {
    let Some(id) = head.strip_prefix('m').and_then(AxisId::parse) else {
        return Command::Ignored;
    };
    let Some(verb) = parse_verb(rest) else {
        return Command::Ignored;
    };
    Command::Axis { id, verb }
}

fn parse_verb(tokens: &[&str]) -> Option<AxisVerb> {
    let (&first, rest) = tokens.split_first()?;
    let second = rest.first().copied();

    let verb = match first {
        "st" => match second? {
            "t" => AxisVerb::Poll(true),
            "f" => AxisVerb::Poll(false),
            _ => return None,
        },
        "read" => AxisVerb::Read,
        "set" => match second? {
            "lo" => AxisVerb::SetLower,
            "hi" => AxisVerb::SetUpper,
            _ => return None,
        },
        "send" => match second? {
            "cfg" => AxisVerb::SendConfig,
            _ => return None,
        },
        "s" => AxisVerb::Stop,
        _ if first.starts_with("moveto") => {
            let inline = &first["moveto".len()..];
            let target = if inline.is_empty() { second } else { Some(inline) };
            AxisVerb::MoveTo(match target {
                None => Err(MoveToError::MissingTarget),
                Some(t) => t.parse::<i32>().map_err(|_| MoveToError::BadTarget),
            })
        }
        _ if first.contains('=') => {
            let mut update = TuningUpdate::default();
            for token in tokens.iter().filter(|t| t.contains('=')) {
                update.absorb(token);
            }
            AxisVerb::Tune(update)
        }
        _ => AxisVerb::Relative(first.parse::<i32>().ok()?),
    };
    Some(verb)
}
