use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};
use turtl_core::time::local_to_utc;
use turtl_core::{CalendarError, CalendarEvent, CalendarService};

const ICS_HEADER: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Turtl//EN\n";
const ICS_FOOTER: &str = "END:VCALENDAR\n";

fn ics_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

fn to_utc(event: &CalendarEvent, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), CalendarError> {
    let start = local_to_utc(event.start, tz).map_err(|e| CalendarError::Rejected(e.to_string()))?;
    let end = local_to_utc(event.end, tz).map_err(|e| CalendarError::Rejected(e.to_string()))?;
    Ok((start, end))
}

/// One VEVENT block. Times are written in UTC.
pub fn event_to_vevent(event: &CalendarEvent, tz: Tz) -> Result<String, CalendarError> {
    let (start, end) = to_utc(event, tz)?;

    let mut s = String::new();
    s.push_str("BEGIN:VEVENT\n");
    s.push_str(&format!("UID:{}@turtl\n", event.task_id));
    s.push_str(&format!("DTSTAMP:{}\n", ics_stamp(Utc::now())));
    s.push_str(&format!("DTSTART:{}\n", ics_stamp(start)));
    s.push_str(&format!("DTEND:{}\n", ics_stamp(end)));
    s.push_str(&format!("SUMMARY:{}\n", escape_ics(&event.title)));
    s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&event.notes)));
    if let Some(alarm) = event.alarm {
        let minutes = alarm.offset_secs.abs() / 60;
        let sign = if alarm.offset_secs < 0 { "-" } else { "" };
        s.push_str("BEGIN:VALARM\n");
        s.push_str("ACTION:DISPLAY\n");
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&event.title)));
        s.push_str(&format!("TRIGGER:{}PT{}M\n", sign, minutes));
        s.push_str("END:VALARM\n");
    }
    s.push_str("END:VEVENT\n");
    Ok(s)
}

/// A standalone calendar document holding a single event.
pub fn event_to_ics(event: &CalendarEvent, tz: Tz) -> Result<String, CalendarError> {
    Ok(format!("{}{}{}", ICS_HEADER, event_to_vevent(event, tz)?, ICS_FOOTER))
}

/// Local `.ics` file acting as the default calendar.
pub struct IcsCalendar {
    path: PathBuf,
    tz: Tz,
}

impl IcsCalendar {
    pub fn new(path: PathBuf, tz: Tz) -> Self {
        Self { path, tz }
    }
}

impl CalendarService for IcsCalendar {
    fn request_access(&mut self) -> bool {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => match fs::create_dir_all(dir) {
                Ok(()) => true,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "calendar directory not writable");
                    false
                }
            },
            _ => true,
        }
    }

    fn save_event(&mut self, event: &CalendarEvent) -> Result<(), CalendarError> {
        let vevent = event_to_vevent(event, self.tz)?;

        let existing = if self.path.exists() {
            fs::read_to_string(&self.path)?
        } else {
            String::new()
        };
        let body = existing.trim_end();
        let body = body.strip_suffix(ICS_FOOTER.trim_end()).unwrap_or(body);

        let mut out = if body.trim().is_empty() {
            ICS_HEADER.to_string()
        } else {
            format!("{}\n", body.trim_end())
        };
        out.push_str(&vevent);
        out.push_str(ICS_FOOTER);

        fs::write(&self.path, out)?;
        debug!(path = %self.path.display(), "appended event");
        Ok(())
    }
}

/// Count VEVENT blocks in a calendar file.
pub fn count_events(path: &std::path::Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(s.lines().filter(|l| l.trim() == "BEGIN:VEVENT").count())
}

/// Google Calendar through `gcalcli import`.
///
/// Requires `gcalcli` installed and authenticated on the machine.
pub struct GcalcliCalendar {
    calendar: Option<String>,
    tz: Tz,
}

impl GcalcliCalendar {
    pub fn new(calendar: Option<String>, tz: Tz) -> Self {
        Self { calendar, tz }
    }
}

impl CalendarService for GcalcliCalendar {
    fn request_access(&mut self) -> bool {
        which::which("gcalcli").is_ok()
    }

    fn save_event(&mut self, event: &CalendarEvent) -> Result<(), CalendarError> {
        let ics = event_to_ics(event, self.tz)?;

        let mut cmd = std::process::Command::new("gcalcli");
        cmd.arg("import");
        if let Some(cal) = &self.calendar {
            cmd.args(["--calendar", cal]);
        }

        let mut child = cmd
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::inherit())
            .spawn()?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| CalendarError::Rejected("gcalcli stdin unavailable".to_string()))?;
            stdin.write_all(ics.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(CalendarError::Rejected(format!("gcalcli import failed: {status}")));
        }
        Ok(())
    }
}
