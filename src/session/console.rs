// The line-oriented voting console.

use crate::session::*;
use std::io::{BufRead, Write};

const HELP: &str = "Commands:
  locate LAT LON   set your position (locate off: forget it)
  where            show the region of your position
  vote CHOICE      vote from your position
  summary          show the votes of all the regions
  regions          list the regions
  export [PATH]    write the choropleth map
  quit             end the session";

#[derive(PartialEq, Debug, Clone)]
enum Command {
    Locate(Option<Coordinate>),
    Where,
    Vote(String),
    Summary,
    Regions,
    Export(Option<String>),
    Help,
    Quit,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Reply {
    Text(String),
    Quit,
}

// Blank lines and lines starting with '#' are ignored.
fn parse_command(line: &str) -> SessionResult<Option<Command>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let cmd = match words.as_slice() {
        [] => return Ok(None),
        [w, ..] if w.starts_with('#') => return Ok(None),
        ["locate", "off"] => Command::Locate(None),
        ["locate", lat, lon] => {
            let coordinate = parse_location(&format!("{},{}", lat, lon))?;
            Command::Locate(Some(coordinate))
        }
        ["locate", ..] => whatever!("Usage: locate LAT LON, or locate off"),
        ["where"] => Command::Where,
        ["vote", choice] => Command::Vote(choice.to_string()),
        ["vote", ..] => whatever!("Usage: vote CHOICE"),
        ["summary"] => Command::Summary,
        ["regions"] => Command::Regions,
        ["export"] => Command::Export(None),
        ["export", path] => Command::Export(Some(path.to_string())),
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        [w, ..] => whatever!("Unknown command {:?} (type help)", w),
    };
    Ok(Some(cmd))
}

impl<D: ChoiceDomain> Session<D> {
    /// Runs one console line.
    pub fn handle(&mut self, line: &str) -> SessionResult<Option<Reply>> {
        let cmd = match parse_command(line)? {
            Some(cmd) => cmd,
            None => return Ok(None),
        };
        debug!("handle: {:?}", cmd);
        let text = match cmd {
            Command::Locate(location) => {
                self.set_location(location);
                match location {
                    Some(c) => format!("Position set to {}", c),
                    None => "Position cleared: voting is disabled until you locate".to_string(),
                }
            }
            Command::Where => {
                let region = self.current_region()?;
                match &region.name {
                    Some(name) => format!("You are in {} ({})", name, region.id),
                    None => format!("You are in {}", region.id),
                }
            }
            Command::Vote(choice) => self.vote(&choice)?,
            Command::Summary => {
                serde_json::to_string_pretty(&self.summary_json()).context(WritingJsonSnafu {})?
            }
            Command::Regions => {
                let lines: Vec<String> = self
                    .catalog()
                    .regions()
                    .iter()
                    .map(|r| format!("{}\t{}", r.id, r.name.clone().unwrap_or_default()))
                    .collect();
                lines.join("\n")
            }
            Command::Export(path) => self.export(path.as_deref())?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Some(Reply::Quit)),
        };
        Ok(Some(Reply::Text(text)))
    }
}

/// Reads commands until `quit` or the end of the input.
///
/// Errors of single commands are printed and do not stop the session.
pub fn run_console<D: ChoiceDomain, R: BufRead, W: Write>(
    session: &mut Session<D>,
    input: R,
    out: &mut W,
) -> SessionResult<()> {
    if let Some(q) = session.question() {
        writeln!(out, "{}", q).context(ConsoleSnafu {})?;
    }
    writeln!(
        out,
        "{} regions loaded ({}). Type help for the commands.",
        session.catalog().len(),
        D::name()
    )
    .context(ConsoleSnafu {})?;
    for line in input.lines() {
        let line = line.context(ConsoleSnafu {})?;
        match session.handle(&line) {
            Ok(Some(Reply::Quit)) => break,
            Ok(Some(Reply::Text(text))) => {
                writeln!(out, "{}", text).context(ConsoleSnafu {})?;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("command {:?} failed: {}", line, e);
                writeln!(out, "error: {}", e).context(ConsoleSnafu {})?;
            }
        }
    }
    info!("Session ended with {} votes", session.ledger().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::session;

    fn transcript<D: ChoiceDomain>(session: &mut Session<D>, input: &str) -> String {
        let mut out: Vec<u8> = Vec::new();
        run_console(session, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn commands() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("# comment").unwrap(), None);
        assert_eq!(
            parse_command("locate 37.9 23.7").unwrap(),
            Some(Command::Locate(Some(Coordinate::new(37.9, 23.7))))
        );
        assert_eq!(
            parse_command("locate off").unwrap(),
            Some(Command::Locate(None))
        );
        assert_eq!(
            parse_command("vote Yes").unwrap(),
            Some(Command::Vote("Yes".to_string()))
        );
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
        assert!(parse_command("locate 37.9").is_err());
        assert!(parse_command("vote").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn voting_session() {
        let mut s: Session<SafetyRating> = session(None);
        let out = transcript(
            &mut s,
            "vote 3\nlocate 37.75 23.25\nwhere\nvote 6\nvote 2\nlocate 37.75 23.75\nvote 5\nquit\nvote 1\n",
        );
        assert!(out.contains("2 regions loaded (safety-rating)"));
        assert!(out.contains("error: Your location is not available"));
        assert!(out.contains("You are in Athens (GRC.1.1.1_1)"));
        assert!(out.contains("error: Invalid choice: \"6\""));
        assert!(out.contains("Recorded 2 for Athens (GRC.1.1.1_1)"));
        assert!(out.contains("Recorded 5 for Piraeus (GRC.1.1.2_1)"));
        // Nothing is read after quit.
        assert_eq!(s.ledger().len(), 2);
    }

    #[test]
    fn location_can_be_lost() {
        let mut s: Session<YesNo> = session(Some(Coordinate::new(37.75, 23.25)));
        let out = transcript(&mut s, "vote yes\nlocate off\nvote no\nwhere\n");
        assert_eq!(s.ledger().len(), 1);
        assert_eq!(out.matches("error: Your location is not available").count(), 2);
    }

    #[test]
    fn summary_and_regions() {
        let mut s: Session<YesNo> = session(Some(Coordinate::new(37.75, 23.25)));
        let out = transcript(&mut s, "vote y\nregions\nsummary\n");
        assert!(out.contains("GRC.1.1.1_1\tAthens"));
        assert!(out.contains("GRC.1.1.2_1\tPiraeus"));
        assert!(!out.contains("Heraklion"));
        assert!(out.contains("\"colorClass\": \"yesMajority\""));
    }

    #[test]
    fn export_needs_a_target() {
        let mut s: Session<YesNo> = session(None);
        let out = transcript(&mut s, "export\n");
        assert!(out.contains("error: No output"));
    }
}
